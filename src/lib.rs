//! seltrans translates the text a user selected on a web page through a
//! locally hosted Ollama server, without leaving the page.
//!
//! The crate is the engine only: the background orchestrator, the
//! cancellable inference client, the message bridge with
//! injection-on-demand, and the page-side overlay state machine. The
//! embedding environment supplies triggers, tabs, notifications, and
//! config persistence through the traits at each seam ([`AgentHost`],
//! [`Notifier`], [`ConfigStore`], [`PageSurface`]); an in-process host
//! ([`LocalHost`], [`MemoryPage`]) ships for the demo binary and tests.
//!
//! At most one translation is in flight per process. A new trigger aborts
//! the previous request, the overlay never shows loading and a terminal
//! state at once, and a request that got superseded can no longer touch
//! any page.

pub mod bridge;
pub mod client;
pub mod config;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod logger;
pub mod messages;
pub mod orchestrator;
pub mod overlay;

pub use bridge::{AgentBridge, AgentHost, HostError, TabId};
pub use config::{Config, ConfigStore, JsonFileStore, MemoryStore};
pub use error::TranslateError;
pub use host::{EditableField, LocalHost, MemoryPage};
pub use lifecycle::{RequestHandle, RequestLifecycle};
pub use messages::{AgentRequest, AgentResponse, BackgroundMessage, CancelAck, Gesture};
pub use orchestrator::{page_eligible, Background, LogNotifier, Notifier};
pub use overlay::{AgentHandle, OverlayRegion, PageSurface};
