use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{missing_key, read_json, transport_error};
use crate::config::ProviderSettings;
use crate::error::AnalysisError;
use crate::provider::{Prompt, ProviderBackend, ProviderId, RequestConfig};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Google generateContent. The instruction and the request travel as one
/// user turn.
pub struct GeminiClient {
    client: Client,
    settings: ProviderSettings,
}

impl GeminiClient {
    pub fn new(client: Client, settings: ProviderSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl ProviderBackend for GeminiClient {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    async fn complete(&self, prompt: &Prompt, config: &RequestConfig) -> Result<String, AnalysisError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or_else(|| missing_key(self.id(), "GOOGLE_API_KEY"))?;

        let text = format!("{}\n\n{}", prompt.system, prompt.user);
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: &text }],
            }],
            generation_config: GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_tokens,
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        );
        let resp = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(self.id(), e))?;

        let body: GenerateResponse = read_json(self.id(), resp).await?;
        let joined: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if joined.trim().is_empty() {
            return Err(AnalysisError::MalformedUpstreamResponse("gemini: empty candidate".into()));
        }
        Ok(joined)
    }
}
