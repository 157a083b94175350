//! Analysis pipeline error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Malformed upstream response: {0}")]
    MalformedUpstreamResponse(String),

    #[error("Invalid analysis format: {0}")]
    InvalidAnalysisFormat(String),

    #[error("Invalid move format: {0}")]
    InvalidMoveFormat(String),

    #[error("Analysis request timed out after {0}s")]
    AnalysisTimeout(u64),

    #[error("Request was cancelled")]
    Cancelled,

    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl AnalysisError {
    /// Whether the retry controller may try again.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            AnalysisError::ProviderUnavailable(_)
                | AnalysisError::RateLimited(_)
                | AnalysisError::MalformedUpstreamResponse(_)
                | AnalysisError::InvalidAnalysisFormat(_)
                | AnalysisError::InvalidMoveFormat(_)
        )
    }

    /// Whether asking the user to retry the same action makes sense.
    pub fn user_can_retry(&self) -> bool {
        self.retryable() || matches!(self, AnalysisError::AnalysisTimeout(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::ProviderUnavailable(_) => "provider_unavailable",
            AnalysisError::RateLimited(_) => "rate_limited",
            AnalysisError::MalformedUpstreamResponse(_) => "malformed_upstream_response",
            AnalysisError::InvalidAnalysisFormat(_) => "invalid_analysis_format",
            AnalysisError::InvalidMoveFormat(_) => "invalid_move_format",
            AnalysisError::AnalysisTimeout(_) => "analysis_timeout",
            AnalysisError::Cancelled => "cancelled",
            AnalysisError::InvalidPosition(_) => "invalid_position",
            AnalysisError::InvalidRequest(_) => "invalid_request",
        }
    }
}

impl From<chess_core::ChessError> for AnalysisError {
    fn from(e: chess_core::ChessError) -> Self {
        AnalysisError::InvalidPosition(e.to_string())
    }
}
