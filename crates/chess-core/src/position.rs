//! Immutable position value over `shakmaty`.
//!
//! Every legality decision goes through here: the rest of the workspace never
//! touches `shakmaty::Move` directly, it works with [`MoveSpec`] (what a user or
//! an AI asked for) and [`PlayedMove`] (a move the rules engine accepted).

use std::fmt;

use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, File, Move, Position as _, Role, Square};

use crate::error::ChessError;

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Halfmove clock value at which the fifty-move rule applies.
const FIFTY_MOVE_HALFMOVES: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "w")]
    White,
    #[serde(rename = "b")]
    Black,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Side::White => "white",
            Side::Black => "black",
        }
    }

    pub(crate) fn from_color(color: Color) -> Side {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }

    pub(crate) fn color(self) -> Color {
        match self {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Serde helper for fields that carry a side as `"white"` / `"black"`.
pub mod side_name {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Side;

    pub fn serialize<S: Serializer>(side: &Side, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(side.name())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Side, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "white" | "w" => Ok(Side::White),
            "black" | "b" => Ok(Side::Black),
            other => Err(serde::de::Error::custom(format!("unknown side: {other}"))),
        }
    }
}

/// A requested move in coordinates, not yet checked against the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveSpec {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

impl MoveSpec {
    /// Parse `"e7"`, `"e8"`, `Some("q")` style input.
    pub fn parse(from: &str, to: &str, promotion: Option<&str>) -> Result<Self, ChessError> {
        let from = parse_square(from)?;
        let to = parse_square(to)?;
        let promotion = match promotion.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => Some(parse_promotion(p)?),
            None => None,
        };
        Ok(Self { from, to, promotion })
    }

    /// Parse long algebraic / UCI form: `e2e4`, `e7e8q`.
    pub fn from_uci(text: &str) -> Result<Self, ChessError> {
        let text = text.trim();
        if !text.is_ascii() || !(4..=5).contains(&text.len()) {
            return Err(ChessError::IllegalMove(text.to_string()));
        }
        let promotion = if text.len() == 5 { Some(&text[4..5]) } else { None };
        Self::parse(&text[0..2], &text[2..4], promotion)
    }
}

fn parse_square(text: &str) -> Result<Square, ChessError> {
    text.trim()
        .to_ascii_lowercase()
        .parse::<Square>()
        .map_err(|_| ChessError::InvalidSquare(text.to_string()))
}

fn parse_promotion(text: &str) -> Result<Role, ChessError> {
    let c = text
        .chars()
        .next()
        .map(|c| c.to_ascii_lowercase())
        .ok_or_else(|| ChessError::InvalidPromotion(text.to_string()))?;
    match Role::from_char(c) {
        Some(role @ (Role::Queen | Role::Rook | Role::Bishop | Role::Knight)) => Ok(role),
        _ => Err(ChessError::InvalidPromotion(text.to_string())),
    }
}

/// A move the rules engine accepted in a specific position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
    /// SAN including the `+` / `#` suffix.
    pub san: String,
    pub is_capture: bool,
    pub is_check: bool,
    pub is_checkmate: bool,
    inner: Move,
}

impl PlayedMove {
    /// SAN without check or mate suffix.
    pub fn bare_san(&self) -> &str {
        self.san.trim_end_matches(['+', '#'])
    }

    pub fn matches(&self, spec: &MoveSpec) -> bool {
        self.from == spec.from
            && self.to == spec.to
            && self.promotion == spec.promotion
    }
}

/// Board + side to move + rights + counters, with its FEN cached.
#[derive(Debug, Clone)]
pub struct Position {
    chess: Chess,
    fen: String,
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.fen == other.fen
    }
}

impl Eq for Position {}

impl Default for Position {
    fn default() -> Self {
        Self::starting()
    }
}

impl Position {
    pub fn starting() -> Self {
        Self::from_chess(Chess::default())
    }

    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let invalid = |reason: String| ChessError::InvalidFen {
            fen: fen.to_string(),
            reason,
        };
        let parsed: Fen = fen.trim().parse().map_err(|e| invalid(format!("{e}")))?;
        let chess: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| invalid(format!("{e}")))?;
        Ok(Self::from_chess(chess))
    }

    fn from_chess(chess: Chess) -> Self {
        let fen = Fen::from_position(&chess, EnPassantMode::Legal).to_string();
        Self { chess, fen }
    }

    pub fn fen(&self) -> &str {
        &self.fen
    }

    /// Read-only access for heuristics.
    pub fn chess(&self) -> &Chess {
        &self.chess
    }

    pub fn turn(&self) -> Side {
        Side::from_color(self.chess.turn())
    }

    pub fn fullmove_number(&self) -> u32 {
        self.chess.fullmoves().get()
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.chess.halfmoves()
    }

    pub fn is_check(&self) -> bool {
        self.chess.is_check()
    }

    pub fn is_checkmate(&self) -> bool {
        self.chess.is_checkmate()
    }

    pub fn is_stalemate(&self) -> bool {
        self.chess.is_stalemate()
    }

    /// Draws decidable from this position alone: stalemate, insufficient
    /// material, fifty-move rule. Repetition needs the game line, see
    /// [`crate::line::GameLine::is_draw`].
    pub fn is_draw(&self) -> bool {
        self.chess.is_stalemate()
            || self.chess.is_insufficient_material()
            || self.halfmove_clock() >= FIFTY_MOVE_HALFMOVES
    }

    pub fn legal_moves(&self) -> Vec<PlayedMove> {
        self.chess
            .legal_moves()
            .iter()
            .filter_map(|mv| self.describe(mv))
            .collect()
    }

    /// Look up the legal move for a coordinate request. A pawn reaching the
    /// last rank without an explicit promotion piece promotes to a queen.
    pub fn find_move(&self, spec: &MoveSpec) -> Option<PlayedMove> {
        let legal = self.legal_moves();
        if let Some(found) = legal.iter().find(|m| m.matches(spec)) {
            return Some(found.clone());
        }
        if spec.promotion.is_none() {
            let queened = MoveSpec {
                promotion: Some(Role::Queen),
                ..*spec
            };
            return legal.into_iter().find(|m| m.matches(&queened));
        }
        None
    }

    /// Apply an already-described move. Fails if the move does not belong to
    /// this position.
    pub fn apply(&self, mv: &PlayedMove) -> Result<Position, ChessError> {
        let legal = self.chess.legal_moves();
        if !legal.iter().any(|m| *m == mv.inner) {
            return Err(ChessError::IllegalMove(mv.san.clone()));
        }
        let mut next = self.chess.clone();
        next.play_unchecked(mv.inner.clone());
        Ok(Self::from_chess(next))
    }

    /// Resolve and apply a coordinate request in one step.
    pub fn play(&self, spec: &MoveSpec) -> Result<(PlayedMove, Position), ChessError> {
        let mv = self.find_move(spec).ok_or_else(|| {
            ChessError::IllegalMove(format!("{}{}", spec.from, spec.to))
        })?;
        let next = self.apply(&mv)?;
        Ok((mv, next))
    }

    pub(crate) fn describe(&self, mv: &Move) -> Option<PlayedMove> {
        let (from, to, promotion) = move_squares(mv)?;
        let mut after = self.chess.clone();
        after.play_unchecked(mv.clone());
        let is_checkmate = after.is_checkmate();
        let is_check = after.is_check();

        let mut san = San::from_move(&self.chess, mv.clone()).to_string();
        if is_checkmate {
            san.push('#');
        } else if is_check {
            san.push('+');
        }

        Some(PlayedMove {
            from,
            to,
            promotion,
            san,
            is_capture: mv.is_capture(),
            is_check,
            is_checkmate,
            inner: mv.clone(),
        })
    }
}

/// King-to-destination squares for castling, like the UI sends them.
fn move_squares(mv: &Move) -> Option<(Square, Square, Option<Role>)> {
    match mv {
        Move::Normal {
            from,
            to,
            promotion,
            ..
        } => Some((*from, *to, *promotion)),
        Move::EnPassant { from, to } => Some((*from, *to, None)),
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() {
                File::G
            } else {
                File::C
            };
            Some((*king, Square::from_coords(file, king.rank()), None))
        }
        Move::Put { .. } => None,
    }
}

/// Strips move counters from FEN, keeping only position + side + castling + ep.
pub fn normalize_fen(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}
