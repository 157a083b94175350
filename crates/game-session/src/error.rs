//! Reasons a game transition was rejected

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Illegal move: {0}")]
    IllegalMove(String),

    #[error("The AI is thinking")]
    AiThinking,

    #[error("The game is over")]
    GameOver,

    #[error("It is not the human player's turn")]
    NotHumanTurn,

    #[error("It is not the AI's turn")]
    NotAiTurn,

    #[error("Viewing an earlier position; navigate to the latest move first")]
    NotLive,

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Move index {0} is out of range")]
    InvalidIndex(usize),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid annotation: {0}")]
    InvalidAnnotation(String),

    #[error("Annotation {0} not found")]
    AnnotationNotFound(Uuid),

    #[error("Result belongs to a superseded AI request")]
    StaleResult,

    #[error("No legal moves in this position")]
    NoLegalMoves,
}
