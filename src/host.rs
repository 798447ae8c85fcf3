//! In-process reference host: tabs, pages, and agent residency.
//!
//! This is the stand-in for the real embedding environment. It keeps a tab
//! registry, spawns agents into pages on demand, tears them down on
//! navigation, and routes user gestures to the resident agent. The demo
//! binary and the test-suite both drive the engine through it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::bridge::{AgentHost, HostError, TabId};
use crate::messages::{AgentRequest, AgentResponse, BackgroundMessage, Gesture};
use crate::overlay::{AgentHandle, OverlayRegion, PageSurface};

/// An editable control with a selection range, in characters.
#[derive(Debug, Clone)]
pub struct EditableField {
    pub value: String,
    pub sel_start: usize,
    pub sel_end: usize,
    pub focused: bool,
}

/// In-memory page: a document selection, an optional editable field, a
/// clipboard, and the two overlay regions. Every render call is also
/// recorded in order so tests can assert signal sequencing.
pub struct MemoryPage {
    pub doc_selection: String,
    pub field: Option<EditableField>,
    pub clipboard: Option<String>,
    pub clipboard_writable: bool,
    pub loading: Option<String>,
    pub result: Option<String>,
    /// What a rich-content replacement spliced into the document, if any.
    pub replaced_doc_text: Option<String>,
    pub render_log: Vec<(OverlayRegion, Option<String>)>,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self {
            doc_selection: String::new(),
            field: None,
            clipboard: None,
            clipboard_writable: true,
            loading: None,
            result: None,
            replaced_doc_text: None,
            render_log: Vec::new(),
        }
    }

    /// A page with `text` selected in the document.
    pub fn with_selection(text: &str) -> Self {
        let mut page = Self::new();
        page.doc_selection = text.to_string();
        page
    }

    /// A page focused on an editable field with the given selection range.
    pub fn with_field(value: &str, sel_start: usize, sel_end: usize) -> Self {
        let mut page = Self::new();
        page.field = Some(EditableField {
            value: value.to_string(),
            sel_start,
            sel_end,
            focused: true,
        });
        page
    }
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self::new()
    }
}

fn char_slice(s: &str, start: usize, end: usize) -> String {
    s.chars().skip(start).take(end.saturating_sub(start)).collect()
}

impl PageSurface for MemoryPage {
    fn selected_text(&mut self) -> String {
        if let Some(field) = &self.field {
            if field.focused {
                return char_slice(&field.value, field.sel_start, field.sel_end);
            }
        }
        self.doc_selection.clone()
    }

    fn replace_selection(&mut self, text: &str) -> bool {
        if let Some(field) = &mut self.field {
            if field.focused {
                let before: String = field.value.chars().take(field.sel_start).collect();
                let after: String = field.value.chars().skip(field.sel_end).collect();
                field.value = format!("{before}{text}{after}");
                let caret = field.sel_start + text.chars().count();
                field.sel_start = caret;
                field.sel_end = caret;
                return true;
            }
        }
        if !self.doc_selection.is_empty() {
            self.replaced_doc_text = Some(text.to_string());
            self.doc_selection.clear();
            return true;
        }
        false
    }

    fn write_clipboard(&mut self, text: &str) -> bool {
        if !self.clipboard_writable {
            return false;
        }
        self.clipboard = Some(text.to_string());
        true
    }

    fn render(&mut self, region: OverlayRegion, content: Option<&str>) {
        self.render_log.push((region, content.map(str::to_string)));
        match region {
            OverlayRegion::Loading => self.loading = content.map(str::to_string),
            OverlayRegion::Result => self.result = content.map(str::to_string),
        }
    }
}

struct Tab {
    url: String,
    surface: Arc<Mutex<dyn PageSurface>>,
    injectable: bool,
    agent: Option<Arc<AgentHandle>>,
}

/// Tab registry plus the delivery/injection surface the bridge talks to.
pub struct LocalHost {
    tabs: Mutex<HashMap<TabId, Tab>>,
    next_id: Mutex<u64>,
    background_tx: mpsc::UnboundedSender<BackgroundMessage>,
}

impl LocalHost {
    /// `background_tx` is handed to every injected agent so its cancel
    /// requests reach the background context.
    pub fn new(background_tx: mpsc::UnboundedSender<BackgroundMessage>) -> Self {
        Self {
            tabs: Mutex::new(HashMap::new()),
            next_id: Mutex::new(0),
            background_tx,
        }
    }

    /// Open a tab with no agent resident yet.
    pub fn open_tab(&self, url: &str, surface: Arc<Mutex<dyn PageSurface>>) -> TabId {
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            TabId(*next)
        };
        self.tabs.lock().unwrap().insert(
            id,
            Tab {
                url: url.to_string(),
                surface,
                injectable: true,
                agent: None,
            },
        );
        id
    }

    /// Mark a tab as refusing script injection, as privileged pages do.
    pub fn set_injectable(&self, tab: TabId, injectable: bool) {
        if let Some(t) = self.tabs.lock().unwrap().get_mut(&tab) {
            t.injectable = injectable;
        }
    }

    /// Load a new URL: the old document's agent is torn down.
    pub fn navigate(&self, tab: TabId, url: &str) {
        if let Some(t) = self.tabs.lock().unwrap().get_mut(&tab) {
            t.url = url.to_string();
            if let Some(agent) = t.agent.take() {
                agent.shutdown();
            }
        }
    }

    /// Route a user gesture to the tab's resident agent, if any.
    pub fn gesture(&self, tab: TabId, gesture: Gesture) {
        if let Some(t) = self.tabs.lock().unwrap().get(&tab) {
            if let Some(agent) = &t.agent {
                agent.gesture(gesture);
            }
        }
    }

    pub fn has_agent(&self, tab: TabId) -> bool {
        self.tabs
            .lock()
            .unwrap()
            .get(&tab)
            .map(|t| t.agent.is_some())
            .unwrap_or(false)
    }

    fn resident_agent(&self, tab: TabId) -> Result<Arc<AgentHandle>, HostError> {
        let tabs = self.tabs.lock().unwrap();
        let t = tabs.get(&tab).ok_or(HostError::UnknownTab)?;
        t.agent.clone().ok_or(HostError::NoAgent)
    }
}

#[async_trait::async_trait]
impl AgentHost for LocalHost {
    async fn deliver(&self, tab: TabId, req: AgentRequest) -> Result<AgentResponse, HostError> {
        let agent = self.resident_agent(tab)?;
        // A dead agent task reads the same as an absent one.
        agent.deliver(req).await.ok_or(HostError::NoAgent)
    }

    async fn inject_agent(&self, tab: TabId) -> Result<(), HostError> {
        let mut tabs = self.tabs.lock().unwrap();
        let t = tabs.get_mut(&tab).ok_or(HostError::UnknownTab)?;
        if !t.injectable {
            return Err(HostError::Refused("script injection rejected by host".to_string()));
        }
        if let Some(old) = t.agent.take() {
            old.shutdown();
        }
        let agent = AgentHandle::spawn(t.surface.clone(), self.background_tx.clone());
        t.agent = Some(Arc::new(agent));
        Ok(())
    }

    fn tab_url(&self, tab: TabId) -> Option<String> {
        self.tabs.lock().unwrap().get(&tab).map(|t| t.url.clone())
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
