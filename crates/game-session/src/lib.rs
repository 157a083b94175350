pub mod annotations;
pub mod error;
pub mod reducer;
pub mod session;
pub mod settings;
pub mod snapshot;

pub use annotations::{Annotation, AnnotationSymbol, Annotations};
pub use error::SessionError;
pub use reducer::{reduce, try_reduce, GameAction};
pub use session::{GameSession, SessionUpdate};
pub use settings::{AiColor, Settings, SettingsPatch};
pub use snapshot::{GameError, GameOver, GameOverReason, GameSnapshot, GameView};
