use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use ai_analysis::service::fetch_move;
use ai_analysis::{ProviderGateway, ProviderId, RequestConfig};
use chess_core::Position;

use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    #[serde(alias = "position")]
    pub fen: String,
    pub provider: ProviderId,
}

#[derive(Debug, Serialize)]
pub struct MoveResponse {
    #[serde(rename = "move")]
    pub san: String,
    pub explanation: String,
    pub from: String,
    pub to: String,
}

/// POST /api/move
/// The returned move is always legal in `fen`.
pub async fn suggest_move(
    Extension(gateway): Extension<Arc<ProviderGateway>>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, AppError> {
    let position = Position::from_fen(&req.fen).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let suggestion = fetch_move(&gateway, &position, req.provider, &RequestConfig::default()).await?;
    tracing::info!(provider = %req.provider, san = %suggestion.played.san, "Move suggested");

    Ok(Json(MoveResponse {
        san: suggestion.played.san.clone(),
        explanation: suggestion.explanation,
        from: suggestion.played.from.to_string(),
        to: suggestion.played.to.to_string(),
    }))
}
