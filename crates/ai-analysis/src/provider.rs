//! Provider ids, request shapes and the backend seam.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// The closed set of AI backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Gpt4,
    Claude,
    Gemini,
}

impl ProviderId {
    pub const ALL: [ProviderId; 3] = [ProviderId::Gpt4, ProviderId::Claude, ProviderId::Gemini];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::Gpt4 => "gpt4",
            ProviderId::Claude => "claude",
            ProviderId::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderId::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("Unknown provider: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Analyze,
    SuggestMove,
}

/// Per-request knobs forwarded to a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    /// "Consider moves up to N moves ahead."
    pub analysis_depth: Option<u32>,
    pub consider_variations: bool,
    /// Coach persona prepended to the provider's instruction.
    pub persona: Option<String>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            analysis_depth: None,
            consider_variations: false,
            persona: None,
        }
    }
}

/// A fully worded request: system instruction plus user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: RequestKind,
    pub system: String,
    pub user: String,
}

/// One upstream AI backend. Implementations return the raw completion text.
#[async_trait]
pub trait ProviderBackend: Send + Sync {
    fn id(&self) -> ProviderId;

    async fn complete(&self, prompt: &Prompt, config: &RequestConfig) -> Result<String, AnalysisError>;
}
