use axum::{body::Bytes, extract::Path, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use chess_core::MoveSpec;
use game_session::{AnnotationSymbol, GameSession, GameSnapshot, GameView, SessionError, Settings, SettingsPatch};

use crate::error::AppError;
use crate::state::GameRegistry;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub view: GameView,
}

impl GameResponse {
    fn new(session: &GameSession, snapshot: &GameSnapshot) -> Self {
        Self {
            id: session.id(),
            created_at: session.created_at(),
            view: snapshot.view(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MoveResult {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub game: GameResponse,
}

#[derive(Debug, Deserialize)]
pub struct HumanMoveRequest {
    pub from: String,
    pub to: String,
    pub promotion: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub index: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnnotationRequest {
    pub move_index: usize,
    pub symbol: AnnotationSymbol,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct AnnotationUpdateRequest {
    pub symbol: AnnotationSymbol,
    #[serde(default)]
    pub comment: String,
}

/// POST /api/games
/// Body is an optional partial settings object.
pub async fn create_game(
    Extension(registry): Extension<Arc<GameRegistry>>,
    body: Bytes,
) -> Result<(StatusCode, Json<GameResponse>), AppError> {
    let patch: SettingsPatch = if body.iter().all(u8::is_ascii_whitespace) {
        SettingsPatch::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest(format!("Invalid settings: {e}")))?
    };
    let settings = Settings::default().patched(&patch)?;

    let session = registry.create(settings)?;
    // The AI opens when it plays White.
    let update = session.resume().await;
    Ok((StatusCode::CREATED, Json(GameResponse::new(&session, &update.snapshot))))
}

/// GET /api/games/{game_id}
pub async fn get_game(
    Extension(registry): Extension<Arc<GameRegistry>>,
    Path(game_id): Path<Uuid>,
) -> Result<Json<GameResponse>, AppError> {
    let session = registry.get(game_id)?;
    let snapshot = session.snapshot().await;
    Ok(Json(GameResponse::new(&session, &snapshot)))
}

/// DELETE /api/games/{game_id}
pub async fn delete_game(
    Extension(registry): Extension<Arc<GameRegistry>>,
    Path(game_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    registry.remove(game_id)?;
    tracing::info!(game_id = %game_id, "Game removed");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/games/{game_id}/moves
/// A rejected move leaves the game untouched and reports `accepted: false`.
pub async fn make_move(
    Extension(registry): Extension<Arc<GameRegistry>>,
    Path(game_id): Path<Uuid>,
    Json(req): Json<HumanMoveRequest>,
) -> Result<Json<MoveResult>, AppError> {
    let session = registry.get(game_id)?;
    let spec = MoveSpec::parse(&req.from, &req.to, req.promotion.as_deref())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let (accepted, reason, snapshot) = match session.human_move(spec).await {
        Ok(update) => (true, None, update.snapshot),
        Err(e) if is_move_rejection(&e) => {
            tracing::debug!(game_id = %game_id, error = %e, "Move rejected");
            (false, Some(e.to_string()), session.snapshot().await)
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(MoveResult {
        accepted,
        reason,
        game: GameResponse::new(&session, &snapshot),
    }))
}

fn is_move_rejection(e: &SessionError) -> bool {
    matches!(
        e,
        SessionError::IllegalMove(_)
            | SessionError::AiThinking
            | SessionError::GameOver
            | SessionError::NotHumanTurn
            | SessionError::NotLive
    )
}

/// POST /api/games/{game_id}/ai-move
/// Starts an AI turn in the background; poll the game for the result.
pub async fn request_ai_move(
    Extension(registry): Extension<Arc<GameRegistry>>,
    Path(game_id): Path<Uuid>,
) -> Result<(StatusCode, Json<GameResponse>), AppError> {
    let session = registry.get(game_id)?;
    let update = session.request_ai_move().await?;
    Ok((StatusCode::ACCEPTED, Json(GameResponse::new(&session, &update.snapshot))))
}

/// POST /api/games/{game_id}/fallback-move
pub async fn fallback_move(
    Extension(registry): Extension<Arc<GameRegistry>>,
    Path(game_id): Path<Uuid>,
) -> Result<Json<GameResponse>, AppError> {
    let session = registry.get(game_id)?;
    let snapshot = session.fallback_move().await?;
    Ok(Json(GameResponse::new(&session, &snapshot)))
}

/// POST /api/games/{game_id}/undo
pub async fn undo(
    Extension(registry): Extension<Arc<GameRegistry>>,
    Path(game_id): Path<Uuid>,
) -> Result<Json<GameResponse>, AppError> {
    let session = registry.get(game_id)?;
    let update = session.undo().await?;
    Ok(Json(GameResponse::new(&session, &update.snapshot)))
}

/// POST /api/games/{game_id}/reset
pub async fn reset(
    Extension(registry): Extension<Arc<GameRegistry>>,
    Path(game_id): Path<Uuid>,
) -> Result<Json<GameResponse>, AppError> {
    let session = registry.get(game_id)?;
    let update = session.reset().await?;
    Ok(Json(GameResponse::new(&session, &update.snapshot)))
}

/// POST /api/games/{game_id}/navigate
pub async fn navigate(
    Extension(registry): Extension<Arc<GameRegistry>>,
    Path(game_id): Path<Uuid>,
    Json(req): Json<NavigateRequest>,
) -> Result<Json<GameResponse>, AppError> {
    let session = registry.get(game_id)?;
    let snapshot = session.navigate(req.index).await?;
    Ok(Json(GameResponse::new(&session, &snapshot)))
}

/// PUT /api/games/{game_id}/settings
pub async fn update_settings(
    Extension(registry): Extension<Arc<GameRegistry>>,
    Path(game_id): Path<Uuid>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<GameResponse>, AppError> {
    let session = registry.get(game_id)?;
    let update = session.update_settings(patch).await?;
    Ok(Json(GameResponse::new(&session, &update.snapshot)))
}

/// POST /api/games/{game_id}/resign
pub async fn resign(
    Extension(registry): Extension<Arc<GameRegistry>>,
    Path(game_id): Path<Uuid>,
) -> Result<Json<GameResponse>, AppError> {
    let session = registry.get(game_id)?;
    let snapshot = session.resign().await?;
    Ok(Json(GameResponse::new(&session, &snapshot)))
}

/// DELETE /api/games/{game_id}/error
pub async fn dismiss_error(
    Extension(registry): Extension<Arc<GameRegistry>>,
    Path(game_id): Path<Uuid>,
) -> Result<Json<GameResponse>, AppError> {
    let session = registry.get(game_id)?;
    let snapshot = session.dismiss_error().await?;
    Ok(Json(GameResponse::new(&session, &snapshot)))
}

/// POST /api/games/{game_id}/annotations
pub async fn add_annotation(
    Extension(registry): Extension<Arc<GameRegistry>>,
    Path(game_id): Path<Uuid>,
    Json(req): Json<NewAnnotationRequest>,
) -> Result<(StatusCode, Json<GameResponse>), AppError> {
    let session = registry.get(game_id)?;
    let snapshot = session
        .add_annotation(req.move_index, req.symbol, req.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(GameResponse::new(&session, &snapshot))))
}

/// PUT /api/games/{game_id}/annotations/{annotation_id}
pub async fn update_annotation(
    Extension(registry): Extension<Arc<GameRegistry>>,
    Path((game_id, annotation_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<AnnotationUpdateRequest>,
) -> Result<Json<GameResponse>, AppError> {
    let session = registry.get(game_id)?;
    let snapshot = session
        .update_annotation(annotation_id, req.symbol, req.comment)
        .await?;
    Ok(Json(GameResponse::new(&session, &snapshot)))
}

/// DELETE /api/games/{game_id}/annotations/{annotation_id}
pub async fn delete_annotation(
    Extension(registry): Extension<Arc<GameRegistry>>,
    Path((game_id, annotation_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<GameResponse>, AppError> {
    let session = registry.get(game_id)?;
    let snapshot = session.delete_annotation(annotation_id).await?;
    Ok(Json(GameResponse::new(&session, &snapshot)))
}
