//! The background context: trigger handling, single-flight request
//! lifecycle, and failure reporting.

use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::bridge::{AgentBridge, AgentHost, TabId};
use crate::client;
use crate::config::ConfigStore;
use crate::error::TranslateError;
use crate::lifecycle::RequestLifecycle;
use crate::messages::{BackgroundMessage, CancelAck};

/// Host-level notification sink. Implementations swallow their own
/// failures; the engine treats notification as fire-and-forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Fallback notifier that writes to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        info!("[notice] {message}");
    }
}

const PRIVILEGED_SCHEMES: [&str; 3] = ["chrome://", "edge://", "about://"];
const WEBSTORE_MARKER: &str = "chrome.google.com/webstore";

/// Whether an agent may be injected into this URL's page. Privileged
/// browser pages and the extension marketplace refuse injection outright,
/// so they are rejected before the bridge is ever involved.
pub fn page_eligible(url: &str) -> bool {
    if PRIVILEGED_SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
        return false;
    }
    !url.contains(WEBSTORE_MARKER)
}

/// The orchestrating context. One per process; it owns the single
/// translation slot, so concurrent triggers supersede each other instead
/// of queuing.
pub struct Background<H: AgentHost, C: ConfigStore, N: Notifier> {
    bridge: AgentBridge<H>,
    config: C,
    notifier: N,
    lifecycle: Mutex<RequestLifecycle>,
}

impl<H, C, N> Background<H, C, N>
where
    H: AgentHost + 'static,
    C: ConfigStore + 'static,
    N: Notifier + 'static,
{
    pub fn new(host: Arc<H>, config: C, notifier: N) -> Arc<Self> {
        Arc::new(Self {
            bridge: AgentBridge::new(host),
            config,
            notifier,
            lifecycle: Mutex::new(RequestLifecycle::new()),
        })
    }

    /// Run the dispatcher for messages arriving from page agents. The
    /// matching sender is what the host hands to every injected agent.
    pub fn spawn_dispatcher(self: &Arc<Self>, mut rx: mpsc::UnboundedReceiver<BackgroundMessage>) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                match msg {
                    BackgroundMessage::CancelTranslation { respond_to } => {
                        let (cancelled, chars) = {
                            let mut lifecycle = this.lifecycle.lock().unwrap();
                            (lifecycle.cancel_current(), lifecycle.active_chars())
                        };
                        debug!(cancelled, ?chars, "cancel request from page");
                        // The agent usually drops the receiver; that's fine.
                        let _ = respond_to.send(CancelAck { ok: true });
                    }
                }
            }
        });
    }

    /// One full cycle: eligibility, selection, loading phase, backend call,
    /// terminal phase. Every failure ends as a single notification.
    pub async fn handle_trigger(&self, tab: TabId) {
        let url = self.bridge.host().tab_url(tab).unwrap_or_default();
        debug!(tab = tab.0, %url, "trigger received");
        if !page_eligible(&url) {
            self.notifier.notify(&TranslateError::PageIneligible.notice());
            return;
        }

        let selected = match self.bridge.get_selection(tab).await {
            Ok(text) => text.trim().to_string(),
            Err(err) => {
                warn!(%err, "selection retrieval failed");
                self.notifier.notify(&err.notice());
                return;
            }
        };
        if selected.is_empty() {
            self.notifier.notify(&TranslateError::NoSelection.notice());
            return;
        }

        let config = self.config.load();
        debug!(endpoint = %config.endpoint, model = %config.model, "config loaded");

        // Advisory. The request goes ahead even if the spinner never shows.
        if let Err(err) = self.bridge.show_loading(tab).await {
            warn!(%err, "could not show the loading overlay");
        }

        let handle = self.lifecycle.lock().unwrap().start(&selected);
        info!(chars = selected.chars().count(), model = %config.model, "translating selection");
        let outcome = client::translate(&selected, &config, handle.token())
            .await
            .and_then(|translated| {
                if translated.is_empty() {
                    Err(TranslateError::EmptyTranslation)
                } else {
                    Ok(translated)
                }
            });
        let still_current = self.lifecycle.lock().unwrap().clear(&handle);

        if !still_current {
            // A newer trigger took the slot. A stale settlement must not
            // touch any overlay; only its cancellation is worth a notice.
            match outcome {
                Err(err) if err.is_cancelled() => self.notifier.notify(&err.notice()),
                Ok(_) => debug!("stale translation result dropped"),
                Err(err) => debug!(%err, "stale translation error dropped"),
            }
            return;
        }

        // The loading overlay must be gone before any terminal signal.
        if let Err(err) = self.bridge.hide_loading(tab).await {
            warn!(%err, "could not hide the loading overlay");
        }

        match outcome {
            Ok(translated) => {
                info!(chars = translated.chars().count(), "translation succeeded");
                if let Err(err) = self
                    .bridge
                    .show_translation(tab, translated, config.replace_selection_when_possible)
                    .await
                {
                    warn!(%err, "could not deliver the translation to the page");
                    self.notifier.notify(&err.notice());
                }
            }
            Err(err) => {
                warn!(%err, "translation failed");
                self.notifier.notify(&err.notice());
            }
        }
    }

    /// Whether a translation is currently in flight.
    pub fn is_translating(&self) -> bool {
        self.lifecycle.lock().unwrap().is_active()
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
