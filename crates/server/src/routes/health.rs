use axum::{Extension, Json};
use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::state::GameRegistry;

/// GET /health
pub async fn health_check(Extension(registry): Extension<Arc<GameRegistry>>) -> Json<JsonValue> {
    Json(serde_json::json!({
        "status": "healthy",
        "activeGames": registry.len(),
    }))
}
