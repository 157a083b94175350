use axum::{Extension, Json};
use serde::Deserialize;
use std::sync::Arc;

use ai_analysis::analysis::DEFAULT_CONFIDENCE;
use ai_analysis::provider::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use ai_analysis::service::fetch_analysis;
use ai_analysis::{Analysis, ProviderGateway, ProviderId, RequestConfig};
use chess_core::Position;

use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeConfig {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub analysis_depth: Option<u32>,
    pub consider_variations: Option<bool>,
}

impl From<AnalyzeConfig> for RequestConfig {
    fn from(c: AnalyzeConfig) -> Self {
        RequestConfig {
            temperature: c.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: c.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            analysis_depth: c.analysis_depth,
            consider_variations: c.consider_variations.unwrap_or(false),
            persona: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(alias = "position")]
    pub fen: String,
    pub provider: ProviderId,
    #[serde(default)]
    pub config: AnalyzeConfig,
}

/// POST /api/analyze
/// One provider round trip; retries are the caller's business.
pub async fn analyze_position(
    Extension(gateway): Extension<Arc<ProviderGateway>>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<Analysis>, AppError> {
    let position = Position::from_fen(&req.fen).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let config = RequestConfig::from(req.config);

    tracing::info!(provider = %req.provider, fen = %position.fen(), "Analyze request");
    let analysis = fetch_analysis(&gateway, &position, req.provider, &config, DEFAULT_CONFIDENCE).await?;
    Ok(Json(analysis))
}
