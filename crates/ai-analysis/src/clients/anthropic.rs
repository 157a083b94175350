use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{missing_key, read_json, transport_error};
use crate::config::ProviderSettings;
use crate::error::AnalysisError;
use crate::provider::{Prompt, ProviderBackend, ProviderId, RequestConfig};

const API_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Anthropic messages API.
pub struct AnthropicClient {
    client: Client,
    settings: ProviderSettings,
}

impl AnthropicClient {
    pub fn new(client: Client, settings: ProviderSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl ProviderBackend for AnthropicClient {
    fn id(&self) -> ProviderId {
        ProviderId::Claude
    }

    async fn complete(&self, prompt: &Prompt, config: &RequestConfig) -> Result<String, AnalysisError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or_else(|| missing_key(self.id(), "ANTHROPIC_API_KEY"))?;

        let request = MessagesRequest {
            model: &self.settings.model,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            system: &prompt.system,
            messages: vec![Message { role: "user", content: &prompt.user }],
        };

        let url = format!("{}/v1/messages", self.settings.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(self.id(), e))?;

        let body: MessagesResponse = read_json(self.id(), resp).await?;
        body.content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| AnalysisError::MalformedUpstreamResponse("claude: no text block".into()))
    }
}
