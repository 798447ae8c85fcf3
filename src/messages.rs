//! The message vocabulary between the background context and page agents.
//!
//! Every cross-context interaction is one of these closed enums, matched
//! exhaustively at the receiving end. An unknown message cannot exist, so
//! nothing is ever silently dropped.

use tokio::sync::oneshot;

/// Requests the background context sends to a page agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentRequest {
    /// Read the current selection.
    GetSelection,
    /// Show or refresh the loading widget.
    ShowLoading,
    /// Remove the loading widget. Idempotent.
    HideLoading,
    /// Deliver the finished translation for display or in-place replacement.
    ShowTranslation {
        translated: String,
        replace_selection: bool,
    },
}

/// Replies from a page agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentResponse {
    Selection { text: String },
    Ack,
}

/// Messages any page agent can send back to the background context.
#[derive(Debug)]
pub enum BackgroundMessage {
    /// The user dismissed the loading widget; abort the in-flight request.
    /// The agent does not wait for the ack, so the sender may be dropped.
    CancelTranslation { respond_to: oneshot::Sender<CancelAck> },
}

/// Receipt for a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelAck {
    pub ok: bool,
}

/// User gestures observed inside a page, routed to its agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Escape key. Cancels the translation while the loading widget shows.
    EscapeKey,
    /// The loading widget's cancel control.
    DismissLoading,
    /// The result widget's dismiss control.
    DismissResult,
}
