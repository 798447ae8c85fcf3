//! Message delivery to page agents, with injection on demand.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::TranslateError;
use crate::messages::{AgentRequest, AgentResponse};

/// Host-assigned page identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(pub u64);

/// Why the host could not deliver or inject.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("no agent resident in the page")]
    NoAgent,
    #[error("unknown tab")]
    UnknownTab,
    #[error("{0}")]
    Refused(String),
}

/// The embedding environment's side of agent messaging. [`crate::host::LocalHost`]
/// implements it in-process; a real host maps it onto its tab and scripting
/// facilities.
#[async_trait::async_trait]
pub trait AgentHost: Send + Sync {
    /// Deliver a request to the tab's resident agent and return its reply.
    async fn deliver(&self, tab: TabId, req: AgentRequest) -> Result<AgentResponse, HostError>;

    /// Instrument the tab with a fresh agent.
    async fn inject_agent(&self, tab: TabId) -> Result<(), HostError>;

    /// URL currently loaded in the tab.
    fn tab_url(&self, tab: TabId) -> Option<String>;
}

/// Delivery with one injection retry.
///
/// A failed send usually means the page was never instrumented, or its
/// agent died with the previous document. One injection plus one resend
/// covers both; anything beyond that is a page we cannot reach, reported
/// as [`TranslateError::AgentUnreachable`].
pub struct AgentBridge<H: AgentHost> {
    host: Arc<H>,
}

impl<H: AgentHost> AgentBridge<H> {
    pub fn new(host: Arc<H>) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub async fn send(
        &self,
        tab: TabId,
        req: AgentRequest,
    ) -> Result<AgentResponse, TranslateError> {
        match self.host.deliver(tab, req.clone()).await {
            Ok(resp) => Ok(resp),
            Err(first) => {
                debug!(tab = tab.0, %first, "delivery failed; injecting agent and retrying");
                if let Err(err) = self.host.inject_agent(tab).await {
                    warn!(tab = tab.0, %err, "agent injection failed");
                    return Err(TranslateError::AgentUnreachable(err.to_string()));
                }
                self.host
                    .deliver(tab, req)
                    .await
                    .map_err(|err| TranslateError::AgentUnreachable(err.to_string()))
            }
        }
    }

    pub async fn get_selection(&self, tab: TabId) -> Result<String, TranslateError> {
        match self.send(tab, AgentRequest::GetSelection).await? {
            AgentResponse::Selection { text } => Ok(text),
            AgentResponse::Ack => Err(TranslateError::AgentUnreachable(
                "unexpected reply to a selection request".to_string(),
            )),
        }
    }

    pub async fn show_loading(&self, tab: TabId) -> Result<(), TranslateError> {
        self.send(tab, AgentRequest::ShowLoading).await.map(|_| ())
    }

    pub async fn hide_loading(&self, tab: TabId) -> Result<(), TranslateError> {
        self.send(tab, AgentRequest::HideLoading).await.map(|_| ())
    }

    pub async fn show_translation(
        &self,
        tab: TabId,
        translated: String,
        replace_selection: bool,
    ) -> Result<(), TranslateError> {
        self.send(tab, AgentRequest::ShowTranslation { translated, replace_selection })
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
