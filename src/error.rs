use thiserror::Error;

/// Everything that can end a trigger-to-settlement cycle early.
///
/// Each variant maps to one user-visible notice; nothing here is allowed to
/// escape the orchestrator as a panic.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// Privileged or marketplace page; the host forbids injecting there.
    #[error("translation is not available on this page")]
    PageIneligible,

    /// Delivery still failed after injecting the agent once.
    #[error("could not reach the in-page agent: {0}")]
    AgentUnreachable(String),

    /// The page reported an empty or whitespace-only selection.
    #[error("no text is selected")]
    NoSelection,

    /// The cancel handle fired before the backend call settled.
    #[error("request was cancelled")]
    Cancelled,

    /// The fixed upper bound elapsed with no backend response.
    #[error("backend did not respond within {0} seconds")]
    Timeout(u64),

    /// Non-2xx backend response. Body kept for diagnostics.
    #[error("backend returned HTTP {status}: {body}")]
    RequestFailed { status: u16, body: String },

    /// The backend could not be reached at all.
    #[error("could not reach the backend: {0}")]
    Network(String),

    /// 2xx response without the expected string `response` field.
    #[error("unexpected response shape from backend")]
    MalformedResponse,

    /// 2xx response whose translation was empty after trimming.
    #[error("backend returned an empty translation")]
    EmptyTranslation,
}

impl TranslateError {
    /// Text for the host notification. Cancellation gets its own wording so
    /// an intentional stop never reads like a failure.
    pub fn notice(&self) -> String {
        match self {
            TranslateError::PageIneligible => {
                "Translation is not available on this page. Try a regular web page.".to_string()
            }
            TranslateError::AgentUnreachable(_) => {
                "The translation agent cannot be injected into this page.".to_string()
            }
            TranslateError::NoSelection => "No text is selected.".to_string(),
            TranslateError::Cancelled => "Translation cancelled.".to_string(),
            other => format!("Translation failed: {other}"),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TranslateError::Cancelled)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
