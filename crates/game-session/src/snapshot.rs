//! The authoritative state of one game and its wire view.

use serde::{Deserialize, Serialize};

use ai_analysis::{Analysis, AnalysisError, ProviderId};
use chess_core::{GameLine, PlayedMove, Position, Side};

use crate::annotations::{Annotation, Annotations};
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameOverReason {
    Checkmate,
    Stalemate,
    Timeout,
    Draw,
    Resignation,
}

impl GameOverReason {
    /// Outcomes that follow from the board alone and vanish when moves are taken back.
    pub fn is_positional(self) -> bool {
        matches!(
            self,
            GameOverReason::Checkmate | GameOverReason::Stalemate | GameOverReason::Draw
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOver {
    pub reason: GameOverReason,
    /// `None` for drawn outcomes.
    pub winner: Option<Side>,
}

/// The single user-visible error slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameError {
    pub provider: ProviderId,
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl GameError {
    pub fn from_analysis(provider: ProviderId, error: &AnalysisError) -> Self {
        Self {
            provider,
            code: error.code().to_string(),
            message: error.to_string(),
            retryable: error.user_can_retry(),
        }
    }
}

/// The outstanding AI turn. Completions carrying any other token or
/// originating FEN are discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub token: u64,
    pub fen: String,
}

/// An earlier ply being viewed; the game itself is untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    pub index: usize,
    pub position: Position,
    /// The ply that produced `position`.
    pub last_move: PlayedMove,
    /// Draw state of the line cut at `index`, repetition included.
    pub is_draw: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub line: GameLine,
    pub cursor: Option<Cursor>,
    pub time_white: u32,
    pub time_black: u32,
    pub is_thinking: bool,
    pub last_move: Option<PlayedMove>,
    pub analysis: Option<Analysis>,
    pub annotations: Annotations,
    pub game_over: Option<GameOver>,
    pub settings: Settings,
    pub ai_side: Side,
    pub error: Option<GameError>,
    pub pending: Option<PendingRequest>,
    /// Next AI request token. Never reset, so tokens stay unique per session.
    pub next_token: u64,
}

impl GameSnapshot {
    pub fn new(settings: Settings, ai_side: Side) -> Self {
        let clock = settings.initial_clock_secs();
        Self {
            line: GameLine::default(),
            cursor: None,
            time_white: clock,
            time_black: clock,
            is_thinking: false,
            last_move: None,
            analysis: None,
            annotations: Annotations::default(),
            game_over: None,
            settings,
            ai_side,
            error: None,
            pending: None,
            next_token: 1,
        }
    }

    /// The position at the tip of the game.
    pub fn live_position(&self) -> &Position {
        self.line.current()
    }

    /// The position on display: the cursor's if navigating, else the live one.
    pub fn position(&self) -> &Position {
        self.cursor
            .as_ref()
            .map_or_else(|| self.line.current(), |c| &c.position)
    }

    pub fn turn(&self) -> Side {
        self.live_position().turn()
    }

    pub fn is_live(&self) -> bool {
        self.cursor.is_none()
    }

    pub fn human_side(&self) -> Side {
        self.ai_side.opposite()
    }

    pub fn is_ai_turn(&self) -> bool {
        self.turn() == self.ai_side
    }

    pub fn is_checkmate(&self) -> bool {
        self.live_position().is_checkmate()
    }

    pub fn is_draw(&self) -> bool {
        self.line.is_draw()
    }

    pub fn clock(&self, side: Side) -> u32 {
        match side {
            Side::White => self.time_white,
            Side::Black => self.time_black,
        }
    }

    pub fn clock_mut(&mut self, side: Side) -> &mut u32 {
        match side {
            Side::White => &mut self.time_white,
            Side::Black => &mut self.time_black,
        }
    }

    /// Whether the AI should be asked for a move right now.
    pub fn wants_ai_move(&self) -> bool {
        self.game_over.is_none() && !self.is_thinking && self.is_live() && self.is_ai_turn()
    }

    pub fn view(&self) -> GameView {
        let position = self.position();
        let (last_move, is_draw) = match &self.cursor {
            Some(cursor) => (Some(&cursor.last_move), cursor.is_draw),
            None => (self.last_move.as_ref(), self.is_draw()),
        };
        GameView {
            fen: position.fen().to_string(),
            live_fen: self.live_position().fen().to_string(),
            turn: position.turn(),
            history: self.line.sans(),
            move_number: position.fullmove_number(),
            is_check: position.is_check(),
            is_checkmate: position.is_checkmate(),
            is_draw,
            last_move: last_move.map(LastMove::from),
            is_thinking: self.is_thinking,
            analysis: self.analysis.clone(),
            annotations: self.annotations.to_vec(),
            game_over: self.game_over,
            time_white: self.time_white,
            time_black: self.time_black,
            settings: self.settings.clone(),
            ai_side: self.ai_side,
            cursor: self.cursor.as_ref().map(|c| c.index),
            error: self.error.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMove {
    pub from: String,
    pub to: String,
    pub san: String,
}

impl From<&PlayedMove> for LastMove {
    fn from(mv: &PlayedMove) -> Self {
        Self {
            from: mv.from.to_string(),
            to: mv.to.to_string(),
            san: mv.san.clone(),
        }
    }
}

/// Serializable rendering of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub fen: String,
    pub live_fen: String,
    pub turn: Side,
    pub history: Vec<String>,
    pub move_number: u32,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_draw: bool,
    pub is_thinking: bool,
    pub last_move: Option<LastMove>,
    pub analysis: Option<Analysis>,
    pub annotations: Vec<Annotation>,
    pub game_over: Option<GameOver>,
    pub time_white: u32,
    pub time_black: u32,
    pub settings: Settings,
    pub ai_side: Side,
    pub cursor: Option<usize>,
    pub error: Option<GameError>,
}
