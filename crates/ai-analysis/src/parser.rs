//! Two-stage parsing of provider text.
//!
//! Stage one is strict: strip code fences and read a JSON object. Stage two
//! only exists for move suggestions and pattern-matches algebraic notation in
//! the raw text. Whatever either stage finds is checked against the legal
//! moves of the position before it is returned.

use serde_json::Value;

use chess_core::notation;
use chess_core::{PlayedMove, Position};

use crate::analysis::ParsedAnalysis;
use crate::error::AnalysisError;

/// A move suggestion that resolved to a legal move.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveSuggestion {
    pub played: PlayedMove,
    pub explanation: String,
}

/// Remove an enclosing Markdown fence (```` ```json ... ``` ````).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`) on the opening line.
    let body = match rest.find('\n') {
        Some(i) => &rest[i + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Stage one: the text (after fence stripping) as a JSON object.
///
/// Falls back to the outermost `{...}` span when a model wraps the object in
/// a sentence.
pub fn parse_json_object(text: &str) -> Option<serde_json::Map<String, Value>> {
    let cleaned = strip_code_fences(text);
    if let Ok(Value::Object(map)) = serde_json::from_str(cleaned) {
        return Some(map);
    }
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str(&cleaned[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Stage two: the first algebraic token in free text.
pub fn extract_move_token(text: &str) -> Option<String> {
    notation::extract_san_tokens(text).into_iter().next()
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_start_matches('+').parse().ok(),
        _ => None,
    }
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        _ => String::new(),
    }
}

fn resolve(position: &Position, candidate: &str) -> Option<PlayedMove> {
    notation::resolve_san(position, candidate)
        .or_else(|| notation::resolve_coordinates(position, candidate))
}

/// Parse an analysis response for `position`.
///
/// Suggested moves that are not legal in the position are dropped.
pub fn parse_analysis(position: &Position, raw: &str) -> Result<ParsedAnalysis, AnalysisError> {
    let object = parse_json_object(raw)
        .ok_or_else(|| AnalysisError::InvalidAnalysisFormat("response is not a JSON object".into()))?;

    let evaluation = object
        .get("evaluation")
        .and_then(number)
        .ok_or_else(|| AnalysisError::InvalidAnalysisFormat("missing numeric evaluation".into()))?;

    let suggested_moves = match object.get("suggestedMoves") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                let (candidate, explanation) = match item {
                    Value::String(s) => (s.clone(), String::new()),
                    Value::Object(m) => (text(m.get("move")), text(m.get("explanation"))),
                    _ => return None,
                };
                resolve(position, &candidate).map(|mv| (mv.san, explanation))
            })
            .collect(),
        _ => Vec::new(),
    };

    let key_points = match object.get("keyPoints") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    };

    Ok(ParsedAnalysis {
        evaluation,
        position_type: object.get("positionType").and_then(|v| v.as_str()).map(String::from),
        suggested_moves,
        key_points,
        detailed_analysis: text(object.get("detailedAnalysis")),
    })
}

/// Parse a move suggestion for `position`.
///
/// A JSON object with a `move` field is authoritative: if that move is not
/// legal the response is rejected. Only text that is not such an object goes
/// through the pattern stage.
pub fn parse_move(position: &Position, raw: &str) -> Result<MoveSuggestion, AnalysisError> {
    if let Some(object) = parse_json_object(raw) {
        if let Some(candidate) = object.get("move").and_then(|v| v.as_str()) {
            let played = resolve(position, candidate).ok_or_else(|| {
                AnalysisError::InvalidMoveFormat(format!("'{candidate}' is not legal in {}", position.fen()))
            })?;
            return Ok(MoveSuggestion {
                played,
                explanation: text(object.get("explanation")),
            });
        }
    }

    let cleaned = strip_code_fences(raw);
    if let Some(token) = extract_move_token(cleaned) {
        // Coordinate text like `g8f6` also matches the algebraic pattern.
        let played = notation::resolve_san(position, &token)
            .or_else(|| notation::find_coordinate_move(position, cleaned))
            .ok_or_else(|| {
                AnalysisError::InvalidMoveFormat(format!("'{token}' is not legal in {}", position.fen()))
            })?;
        return Ok(MoveSuggestion {
            played,
            explanation: String::new(),
        });
    }

    notation::find_coordinate_move(position, cleaned)
        .map(|played| MoveSuggestion {
            played,
            explanation: String::new(),
        })
        .ok_or_else(|| AnalysisError::InvalidMoveFormat("no move found in response".into()))
}
