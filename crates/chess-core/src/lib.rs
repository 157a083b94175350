pub mod error;
pub mod heuristics;
pub mod line;
pub mod notation;
pub mod position;

pub use error::ChessError;
pub use heuristics::{PositionalFactor, Threat};
pub use line::GameLine;
pub use position::{normalize_fen, MoveSpec, PlayedMove, Position, Side, STANDARD_START_FEN};
