//! Uniform entry point over the provider backends.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::clients::{self, AnthropicClient, GeminiClient, OpenAiClient};
use crate::config::GatewayConfig;
use crate::error::AnalysisError;
use crate::prompts;
use crate::provider::{ProviderBackend, ProviderId, RequestConfig, RequestKind};

/// Built once at startup and shared behind an `Arc`.
pub struct ProviderGateway {
    backends: HashMap<ProviderId, Arc<dyn ProviderBackend>>,
}

impl ProviderGateway {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, AnalysisError> {
        let http = clients::http_client(config.http_timeout)?;

        for (id, settings) in [
            (ProviderId::Gpt4, &config.openai),
            (ProviderId::Claude, &config.anthropic),
            (ProviderId::Gemini, &config.gemini),
        ] {
            if settings.api_key.is_some() {
                info!(provider = %id, model = %settings.model, "Provider configured");
            } else {
                info!(provider = %id, "Provider has no API key - calls will report unavailable");
            }
        }

        Ok(Self::with_backends(vec![
            Arc::new(OpenAiClient::new(http.clone(), config.openai.clone())),
            Arc::new(AnthropicClient::new(http.clone(), config.anthropic.clone())),
            Arc::new(GeminiClient::new(http, config.gemini.clone())),
        ]))
    }

    /// Gateway over an explicit backend set. A provider without a backend
    /// reports `ProviderUnavailable`.
    pub fn with_backends(backends: Vec<Arc<dyn ProviderBackend>>) -> Self {
        Self {
            backends: backends.into_iter().map(|b| (b.id(), b)).collect(),
        }
    }

    /// Raw completion text for one request.
    pub async fn request(
        &self,
        provider: ProviderId,
        kind: RequestKind,
        fen: &str,
        config: &RequestConfig,
    ) -> Result<String, AnalysisError> {
        let backend = self
            .backends
            .get(&provider)
            .ok_or_else(|| AnalysisError::ProviderUnavailable(format!("{provider}: no backend")))?;

        let prompt = prompts::build_prompt(provider, kind, fen, config);
        debug!(provider = %provider, kind = ?kind, fen = %fen, "Calling provider");
        let text = backend.complete(&prompt, config).await?;
        debug!(provider = %provider, bytes = text.len(), "Provider responded");
        Ok(text)
    }
}
