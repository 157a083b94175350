use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use ai_analysis::AnalysisError;
use game_session::SessionError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

fn analysis_status(e: &AnalysisError) -> StatusCode {
    match e {
        AnalysisError::InvalidPosition(_) | AnalysisError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        AnalysisError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        AnalysisError::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AnalysisError::AnalysisTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        AnalysisError::MalformedUpstreamResponse(_)
        | AnalysisError::InvalidAnalysisFormat(_)
        | AnalysisError::InvalidMoveFormat(_) => StatusCode::BAD_GATEWAY,
        AnalysisError::Cancelled => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn session_status(e: &SessionError) -> StatusCode {
    match e {
        SessionError::IllegalMove(_)
        | SessionError::InvalidIndex(_)
        | SessionError::InvalidSettings(_)
        | SessionError::InvalidAnnotation(_) => StatusCode::BAD_REQUEST,
        SessionError::AnnotationNotFound(_) => StatusCode::NOT_FOUND,
        SessionError::AiThinking
        | SessionError::GameOver
        | SessionError::NotHumanTurn
        | SessionError::NotAiTurn
        | SessionError::NotLive
        | SessionError::NothingToUndo
        | SessionError::StaleResult
        | SessionError::NoLegalMoves => StatusCode::CONFLICT,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), None)
            }
            AppError::Analysis(e) => {
                tracing::warn!(code = e.code(), "Analysis request failed: {e}");
                (analysis_status(e), e.to_string(), Some(e.code()))
            }
            AppError::Session(e) => (session_status(e), e.to_string(), None),
        };

        let body = match details {
            Some(details) => json!({ "error": message, "details": details }),
            None => json!({ "error": message }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_errors_carry_code() {
        let resp = AppError::from(AnalysisError::RateLimited("quota".into())).into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        let resp = AppError::from(AnalysisError::AnalysisTimeout(30)).into_response();
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_session_errors_map_to_client_statuses() {
        assert_eq!(
            AppError::from(SessionError::NothingToUndo).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(SessionError::InvalidIndex(9)).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal("lock".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
