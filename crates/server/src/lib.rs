pub mod clock;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{delete, get, post, put},
    Extension, Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};

use ai_analysis::ProviderGateway;

use crate::state::GameRegistry;

/// Build the full router over `gateway`. Games idle for `game_idle_ttl` are
/// swept away in the background, so this must run inside a Tokio runtime.
pub fn app(gateway: Arc<ProviderGateway>, game_idle_ttl: Duration) -> Router {
    let registry = Arc::new(GameRegistry::new(Arc::clone(&gateway), game_idle_ttl));
    state::spawn_sweeper(&registry, state::SWEEP_INTERVAL);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(routes::health::health_check))
        // Stateless provider endpoints
        .route("/api/analyze", post(routes::analyze::analyze_position))
        .route("/api/move", post(routes::suggest::suggest_move))
        // Games
        .route("/api/games", post(routes::games::create_game))
        .route(
            "/api/games/{game_id}",
            get(routes::games::get_game).delete(routes::games::delete_game),
        )
        .route("/api/games/{game_id}/moves", post(routes::games::make_move))
        .route("/api/games/{game_id}/ai-move", post(routes::games::request_ai_move))
        .route("/api/games/{game_id}/fallback-move", post(routes::games::fallback_move))
        .route("/api/games/{game_id}/undo", post(routes::games::undo))
        .route("/api/games/{game_id}/reset", post(routes::games::reset))
        .route("/api/games/{game_id}/navigate", post(routes::games::navigate))
        .route("/api/games/{game_id}/resign", post(routes::games::resign))
        .route("/api/games/{game_id}/settings", put(routes::games::update_settings))
        .route("/api/games/{game_id}/error", delete(routes::games::dismiss_error))
        .route("/api/games/{game_id}/annotations", post(routes::games::add_annotation))
        .route(
            "/api/games/{game_id}/annotations/{annotation_id}",
            put(routes::games::update_annotation).delete(routes::games::delete_annotation),
        )
        // Shared state
        .layer(Extension(gateway))
        .layer(Extension(registry))
        .layer(CompressionLayer::new())
        .layer(cors)
}
