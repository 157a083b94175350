//! Resolving move text against a position's legal moves.

use std::sync::LazyLock;

use regex::Regex;
use shakmaty::san::San;

use crate::position::{MoveSpec, PlayedMove, Position};

/// Algebraic move tokens: piece, disambiguation, capture, destination,
/// promotion, or castling (also written with zeros).
static SAN_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:O-O-O|O-O|0-0-0|0-0|[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=?[QRBN])?[+#]?)")
        .unwrap()
});

/// Coordinate form (`e2e4`, `e7e8q`) as a whole word.
static COORDINATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-h][1-8]-?[a-h][1-8][qrbnQRBN]?\b").unwrap());

/// All algebraic tokens in free text, in order.
pub fn extract_san_tokens(text: &str) -> Vec<String> {
    SAN_TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Turn one SAN token into the legal move it names.
///
/// Tolerates annotation glyphs, missing or wrong check suffixes, castling with
/// zeros and `e8Q` without the `=`.
pub fn resolve_san(position: &Position, token: &str) -> Option<PlayedMove> {
    let cleaned = clean_san(token);
    if cleaned.is_empty() {
        return None;
    }

    if let Ok(san) = cleaned.parse::<San>() {
        if let Ok(mv) = san.to_move(position.chess()) {
            return position.describe(&mv);
        }
    }

    position
        .legal_moves()
        .into_iter()
        .find(|m| m.bare_san() == cleaned)
}

/// Coordinate fallback: `e2e4`, `e2-e4`, `e7e8q`.
pub fn resolve_coordinates(position: &Position, text: &str) -> Option<PlayedMove> {
    let compact: String = text.trim().chars().filter(|c| *c != '-').collect();
    let spec = MoveSpec::from_uci(&compact).ok()?;
    position.find_move(&spec)
}

/// First coordinate-looking token in free text that is legal here.
pub fn find_coordinate_move(position: &Position, text: &str) -> Option<PlayedMove> {
    COORDINATE_TOKEN
        .find_iter(text)
        .find_map(|m| resolve_coordinates(position, m.as_str()))
}

fn clean_san(token: &str) -> String {
    let trimmed = token
        .trim()
        .trim_end_matches(['!', '?', '+', '#'])
        .replace('0', "O");

    // e8Q -> e8=Q
    let bytes = trimmed.as_bytes();
    if bytes.len() >= 3 {
        let last = bytes[bytes.len() - 1];
        let before = bytes[bytes.len() - 2];
        if matches!(last, b'Q' | b'R' | b'B' | b'N') && before.is_ascii_digit() {
            let (head, piece) = trimmed.split_at(trimmed.len() - 1);
            return format!("{head}={piece}");
        }
    }
    trimmed
}

/// SAN sequence of a chain of played moves.
pub fn history_of(moves: &[PlayedMove]) -> Vec<String> {
    moves.iter().map(|m| m.san.clone()).collect()
}
