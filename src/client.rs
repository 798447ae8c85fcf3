//! One-shot, cancellable calls against the Ollama generate endpoint.

use once_cell::sync::Lazy;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::Config;
use crate::error::TranslateError;

/// Upper bound on one backend call. A local server that stops answering
/// must not hang the request forever.
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

// No cookie store and no auth headers; the backend is a local service and
// must never see cross-origin credentials.
static CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .build()
        .expect("failed to build client")
});

#[derive(serde::Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

fn build_prompt(text: &str) -> String {
    format!(
        "Translate the following English text into natural Korean.\n\
         - Preserve meaning, tone, and formatting.\n\
         - Do NOT add explanations or brackets.\n\
         - Return ONLY the Korean translation.\n\
         --- BEGIN TEXT ---\n{text}\n--- END TEXT ---"
    )
}

/// Translate `text` with the configured model. Settles with `Cancelled` as
/// soon as `cancel` fires, with `Timeout` after the fixed upper bound, and
/// never retries on its own.
pub async fn translate(
    text: &str,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<String, TranslateError> {
    translate_with_limit(text, config, cancel, Duration::from_secs(REQUEST_TIMEOUT_SECS)).await
}

async fn translate_with_limit(
    text: &str,
    config: &Config,
    cancel: &CancellationToken,
    limit: Duration,
) -> Result<String, TranslateError> {
    let endpoint = config.endpoint.strip_suffix('/').unwrap_or(&config.endpoint);
    let prompt = build_prompt(text);
    let body = GenerateRequest {
        model: &config.model,
        prompt: &prompt,
        stream: config.stream,
    };
    debug!(endpoint, model = %config.model, chars = text.len(), "issuing generate request");

    let call = request_once(endpoint, &body);
    tokio::select! {
        _ = cancel.cancelled() => Err(TranslateError::Cancelled),
        settled = tokio::time::timeout(limit, call) => match settled {
            Ok(outcome) => outcome,
            Err(_) => Err(TranslateError::Timeout(limit.as_secs())),
        },
    }
}

async fn request_once(
    endpoint: &str,
    body: &GenerateRequest<'_>,
) -> Result<String, TranslateError> {
    let resp = CLIENT
        .post(endpoint)
        .json(body)
        .send()
        .await
        .map_err(|e| TranslateError::Network(e.to_string()))?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(TranslateError::RequestFailed { status, body });
    }

    let data: serde_json::Value = resp
        .json()
        .await
        .map_err(|_| TranslateError::MalformedResponse)?;
    match data.get("response").and_then(|v| v.as_str()) {
        Some(s) => Ok(s.trim().to_string()),
        None => Err(TranslateError::MalformedResponse),
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
