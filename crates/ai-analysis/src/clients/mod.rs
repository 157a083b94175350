//! HTTP backends for the three providers.

pub mod anthropic;
pub mod gemini;
pub mod openai;

pub use anthropic::AnthropicClient;
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::AnalysisError;
use crate::provider::ProviderId;

/// Shared reqwest client for all backends.
pub fn http_client(timeout: Duration) -> Result<Client, AnalysisError> {
    Client::builder()
        .user_agent("LlmChess/1.0")
        .timeout(timeout)
        .build()
        .map_err(|e| AnalysisError::ProviderUnavailable(format!("HTTP client setup failed: {e}")))
}

pub(crate) fn missing_key(provider: ProviderId, var: &str) -> AnalysisError {
    AnalysisError::ProviderUnavailable(format!("{provider}: {var} not configured"))
}

pub(crate) fn transport_error(provider: ProviderId, e: reqwest::Error) -> AnalysisError {
    AnalysisError::ProviderUnavailable(format!("{provider}: request error: {e}"))
}

/// Map an upstream status to the error taxonomy:
/// 429 is rate limiting, 5xx is unavailability, anything else is malformed.
pub(crate) fn status_error(provider: ProviderId, status: StatusCode, body: &str) -> AnalysisError {
    let detail = format!("{provider}: HTTP {status}: {}", truncate(body, 300));
    if status == StatusCode::TOO_MANY_REQUESTS {
        AnalysisError::RateLimited(detail)
    } else if status.is_server_error() {
        AnalysisError::ProviderUnavailable(detail)
    } else {
        AnalysisError::MalformedUpstreamResponse(detail)
    }
}

/// Check the status and decode the JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: ProviderId,
    resp: Response,
) -> Result<T, AnalysisError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(status_error(provider, status, &body));
    }
    resp.json::<T>().await.map_err(|e| {
        AnalysisError::MalformedUpstreamResponse(format!("{provider}: unreadable body: {e}"))
    })
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}
