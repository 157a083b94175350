//! A game line: start position plus the moves played from it.

use crate::error::ChessError;
use crate::notation;
use crate::position::{normalize_fen, PlayedMove, Position};

/// Occurrences of a position that make a repetition draw.
const REPETITION_DRAW: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameLine {
    start: Position,
    /// `positions[i]` is the position after `moves[i]`.
    positions: Vec<Position>,
    moves: Vec<PlayedMove>,
}

impl GameLine {
    pub fn new(start: Position) -> Self {
        Self {
            start,
            positions: Vec::new(),
            moves: Vec::new(),
        }
    }

    /// Rebuild a line from SAN text, stopping after ply index `upto` if given.
    pub fn replay(start: Position, sans: &[String], upto: Option<usize>) -> Result<Self, ChessError> {
        let mut line = Self::new(start);
        let limit = upto.map_or(sans.len(), |i| (i + 1).min(sans.len()));
        for san in &sans[..limit] {
            let mv = notation::resolve_san(line.current(), san)
                .ok_or_else(|| ChessError::IllegalMove(san.clone()))?;
            line.push(mv)?;
        }
        Ok(line)
    }

    pub fn start(&self) -> &Position {
        &self.start
    }

    pub fn current(&self) -> &Position {
        self.positions.last().unwrap_or(&self.start)
    }

    pub fn moves(&self) -> &[PlayedMove] {
        &self.moves
    }

    pub fn last_move(&self) -> Option<&PlayedMove> {
        self.moves.last()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Position after ply index `index`.
    pub fn position_after(&self, index: usize) -> Option<&Position> {
        self.positions.get(index)
    }

    pub fn sans(&self) -> Vec<String> {
        notation::history_of(&self.moves)
    }

    pub fn push(&mut self, mv: PlayedMove) -> Result<&Position, ChessError> {
        let next = self.current().apply(&mv)?;
        self.positions.push(next);
        self.moves.push(mv);
        Ok(self.current())
    }

    pub fn pop(&mut self) -> Option<PlayedMove> {
        self.positions.pop();
        self.moves.pop()
    }

    /// Current position repeated three times along this line.
    pub fn is_threefold_repetition(&self) -> bool {
        let key = normalize_fen(self.current().fen());
        std::iter::once(&self.start)
            .chain(self.positions.iter())
            .filter(|p| normalize_fen(p.fen()) == key)
            .count()
            >= REPETITION_DRAW
    }

    pub fn is_draw(&self) -> bool {
        self.current().is_draw() || self.is_threefold_repetition()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::MoveSpec;

    fn push_uci(line: &mut GameLine, uci: &str) {
        let mv = line.current().find_move(&MoveSpec::from_uci(uci).unwrap()).unwrap();
        line.push(mv).unwrap();
    }

    #[test]
    fn test_push_pop() {
        let mut line = GameLine::new(Position::starting());
        push_uci(&mut line, "e2e4");
        push_uci(&mut line, "e7e5");
        assert_eq!(line.sans(), vec!["e4", "e5"]);
        assert_eq!(line.len(), 2);

        let popped = line.pop().unwrap();
        assert_eq!(popped.san, "e5");
        assert_eq!(line.current(), line.position_after(0).unwrap());

        line.pop();
        assert!(line.pop().is_none());
        assert_eq!(line.current(), &Position::starting());
    }

    #[test]
    fn test_replay_upto() {
        let sans: Vec<String> = ["e4", "e5", "Nf3", "Nc6"].iter().map(|s| s.to_string()).collect();
        let full = GameLine::replay(Position::starting(), &sans, None).unwrap();
        assert_eq!(full.len(), 4);

        let partial = GameLine::replay(Position::starting(), &sans, Some(1)).unwrap();
        assert_eq!(partial.sans(), vec!["e4", "e5"]);
        assert_eq!(partial.current(), full.position_after(1).unwrap());
    }

    #[test]
    fn test_replay_rejects_illegal() {
        let sans = vec!["e4".to_string(), "e4".to_string()];
        assert!(GameLine::replay(Position::starting(), &sans, None).is_err());
    }

    #[test]
    fn test_threefold_repetition() {
        let mut line = GameLine::new(Position::starting());
        for _ in 0..2 {
            for uci in ["g1f3", "g8f6", "f3g1", "f6g8"] {
                push_uci(&mut line, uci);
            }
        }
        assert!(line.is_threefold_repetition());
        assert!(line.is_draw());

        line.pop();
        assert!(!line.is_draw());
    }
}
