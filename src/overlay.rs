//! The in-page agent: selection access and the overlay state machine.
//!
//! One agent runs per instrumented page, as its own task. It owns the two
//! overlay widgets and mutates the page only through [`PageSurface`], so the
//! background context never touches page state directly; everything arrives
//! as a message.
//!
//! Widget rules: one loading instance and one result instance at most, a
//! repeated show updates the existing instance in place, hiding is
//! idempotent, and hiding always invalidates the widget's pending
//! auto-dismiss timer so a stale timer cannot act on a newer widget.

use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::debug;

use crate::messages::{AgentRequest, AgentResponse, BackgroundMessage, CancelAck, Gesture};

const LOADING_TEXT: &str = "Translating...";
const REPLACED_TEXT: &str = "Replaced the selection with the translation. (Also copied.)";

/// How long the result widget stays up without being dismissed.
pub const RESULT_TTL: Duration = Duration::from_secs(8);
/// Safety expiry for the loading widget, above the network upper bound, so
/// a lost hide message cannot strand the spinner.
pub const LOADING_TTL: Duration = Duration::from_secs(90);

/// Overlay regions a page hosts. Loading and Result are independent; one
/// widget of each kind may exist at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayRegion {
    Loading,
    Result,
}

/// Raw operations the agent performs on its page. Implemented by the
/// embedding host; [`crate::host::MemoryPage`] is the in-memory reference.
pub trait PageSurface: Send + 'static {
    /// Current selection, preferring a focused editable field's range over
    /// the document selection.
    fn selected_text(&mut self) -> String;

    /// Replace the selected range with `text`. Returns false when nothing
    /// replaceable is selected at the current focus.
    fn replace_selection(&mut self, text: &str) -> bool;

    /// Best-effort clipboard write. Failure is not an error.
    fn write_clipboard(&mut self, text: &str) -> bool;

    /// Render `content` into `region`, or remove the region's node when
    /// `None`. Rendering into an occupied region replaces its content.
    fn render(&mut self, region: OverlayRegion, content: Option<&str>);
}

/// One singleton widget. The epoch advances on every show and hide; an
/// auto-dismiss timer only fires if its epoch still matches.
struct WidgetHandle {
    region: OverlayRegion,
    epoch: u64,
    visible: bool,
}

impl WidgetHandle {
    fn new(region: OverlayRegion) -> Self {
        Self { region, epoch: 0, visible: false }
    }

    fn show(&mut self, surface: &mut dyn PageSurface, content: &str) -> u64 {
        self.epoch += 1;
        self.visible = true;
        surface.render(self.region, Some(content));
        self.epoch
    }

    fn hide(&mut self, surface: &mut dyn PageSurface) {
        self.epoch += 1;
        if self.visible {
            self.visible = false;
            surface.render(self.region, None);
        }
    }

    fn expire(&mut self, surface: &mut dyn PageSurface, epoch: u64) {
        if self.visible && self.epoch == epoch {
            self.hide(surface);
        }
    }
}

enum AgentMsg {
    Request {
        req: AgentRequest,
        respond_to: oneshot::Sender<AgentResponse>,
    },
    Gesture(Gesture),
    Expire { region: OverlayRegion, epoch: u64 },
}

/// Handle to a running page agent. Dropping it does not stop the agent;
/// call [`AgentHandle::shutdown`] on navigation teardown.
pub struct AgentHandle {
    tx: mpsc::UnboundedSender<AgentMsg>,
    task: JoinHandle<()>,
}

impl AgentHandle {
    /// Instrument a page: spawn its agent task. `background` is where the
    /// agent sends cancel requests.
    pub fn spawn(
        surface: Arc<Mutex<dyn PageSurface>>,
        background: mpsc::UnboundedSender<BackgroundMessage>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let agent = Agent {
            surface,
            background,
            self_tx: tx.clone(),
            loading: WidgetHandle::new(OverlayRegion::Loading),
            result: WidgetHandle::new(OverlayRegion::Result),
        };
        let task = tokio::spawn(agent.run(rx));
        Self { tx, task }
    }

    /// Deliver a request and wait for the reply. `None` means the agent is
    /// gone (its page navigated away or the task ended).
    pub async fn deliver(&self, req: AgentRequest) -> Option<AgentResponse> {
        let (respond_to, rx) = oneshot::channel();
        self.tx.send(AgentMsg::Request { req, respond_to }).ok()?;
        rx.await.ok()
    }

    /// Route a user gesture to the agent. Gestures never carry replies.
    pub fn gesture(&self, gesture: Gesture) {
        let _ = self.tx.send(AgentMsg::Gesture(gesture));
    }

    /// Tear the agent down, as page navigation does.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

struct Agent {
    surface: Arc<Mutex<dyn PageSurface>>,
    background: mpsc::UnboundedSender<BackgroundMessage>,
    self_tx: mpsc::UnboundedSender<AgentMsg>,
    loading: WidgetHandle,
    result: WidgetHandle,
}

impl Agent {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<AgentMsg>) {
        while let Some(msg) = rx.recv().await {
            match msg {
                AgentMsg::Request { req, respond_to } => {
                    let resp = self.handle_request(req);
                    let _ = respond_to.send(resp);
                }
                AgentMsg::Gesture(gesture) => self.handle_gesture(gesture),
                AgentMsg::Expire { region, epoch } => {
                    let mut surface = self.surface.lock().unwrap();
                    match region {
                        OverlayRegion::Loading => self.loading.expire(&mut *surface, epoch),
                        OverlayRegion::Result => self.result.expire(&mut *surface, epoch),
                    }
                }
            }
        }
    }

    fn handle_request(&mut self, req: AgentRequest) -> AgentResponse {
        match req {
            AgentRequest::GetSelection => {
                let text = self.surface.lock().unwrap().selected_text();
                AgentResponse::Selection { text }
            }
            AgentRequest::ShowLoading => {
                let epoch = {
                    let mut surface = self.surface.lock().unwrap();
                    self.loading.show(&mut *surface, LOADING_TEXT)
                };
                self.schedule_expiry(OverlayRegion::Loading, epoch, LOADING_TTL);
                AgentResponse::Ack
            }
            AgentRequest::HideLoading => {
                let mut surface = self.surface.lock().unwrap();
                self.loading.hide(&mut *surface);
                AgentResponse::Ack
            }
            AgentRequest::ShowTranslation { translated, replace_selection } => {
                self.show_translation(&translated, replace_selection);
                AgentResponse::Ack
            }
        }
    }

    fn show_translation(&mut self, translated: &str, replace_selection: bool) {
        if translated.is_empty() {
            return;
        }
        let epoch = {
            let mut surface = self.surface.lock().unwrap();
            let replaced = replace_selection && surface.replace_selection(translated);
            let shown = if replaced { REPLACED_TEXT } else { translated };
            let epoch = self.result.show(&mut *surface, shown);
            if !surface.write_clipboard(translated) {
                debug!("clipboard write failed; ignored");
            }
            epoch
        };
        self.schedule_expiry(OverlayRegion::Result, epoch, RESULT_TTL);
    }

    fn handle_gesture(&mut self, gesture: Gesture) {
        match gesture {
            Gesture::EscapeKey | Gesture::DismissLoading => {
                if !self.loading.visible {
                    return;
                }
                // Tear the spinner down right away, then tell the background
                // context. No waiting for the ack.
                {
                    let mut surface = self.surface.lock().unwrap();
                    self.loading.hide(&mut *surface);
                }
                let (respond_to, _discarded) = oneshot::channel::<CancelAck>();
                let _ = self
                    .background
                    .send(BackgroundMessage::CancelTranslation { respond_to });
                debug!("cancel requested from page");
            }
            Gesture::DismissResult => {
                let mut surface = self.surface.lock().unwrap();
                self.result.hide(&mut *surface);
            }
        }
    }

    fn schedule_expiry(&self, region: OverlayRegion, epoch: u64, ttl: Duration) {
        let tx = self.self_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let _ = tx.send(AgentMsg::Expire { region, epoch });
        });
    }
}

#[cfg(test)]
#[path = "overlay_tests.rs"]
mod tests;
