//! Typed analysis and the numeric derivations applied to every evaluation.

use serde::{Deserialize, Serialize};

use chess_core::heuristics;
use chess_core::{Position, PositionalFactor, Side, Threat};

use crate::provider::ProviderId;

pub const MAX_EVALUATION: f64 = 5.0;

/// Confidence attached when no difficulty level is in play.
pub const DEFAULT_CONFIDENCE: f64 = 0.8;

const WINNING_MARGIN: f64 = 3.0;
const ADVANTAGE_MARGIN: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionType {
    BlackWinning,
    BlackAdvantage,
    Equal,
    WhiteAdvantage,
    WhiteWinning,
}

impl PositionType {
    pub fn from_evaluation(evaluation: f64) -> Self {
        if evaluation > WINNING_MARGIN {
            PositionType::WhiteWinning
        } else if evaluation < -WINNING_MARGIN {
            PositionType::BlackWinning
        } else if evaluation > ADVANTAGE_MARGIN {
            PositionType::WhiteAdvantage
        } else if evaluation < -ADVANTAGE_MARGIN {
            PositionType::BlackAdvantage
        } else {
            PositionType::Equal
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "black_winning" => Some(PositionType::BlackWinning),
            "black_advantage" => Some(PositionType::BlackAdvantage),
            "equal" => Some(PositionType::Equal),
            "white_advantage" => Some(PositionType::WhiteAdvantage),
            "white_winning" => Some(PositionType::WhiteWinning),
            _ => None,
        }
    }
}

/// How easy the position is to read, not how strong the player is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Clarity {
    Beginner,
    Intermediate,
    Advanced,
}

pub fn clamp_evaluation(evaluation: f64) -> f64 {
    if evaluation.is_nan() {
        return 0.0;
    }
    evaluation.clamp(-MAX_EVALUATION, MAX_EVALUATION)
}

/// `clamp(50 + 10e, 0, 100)`.
pub fn equality_percentage(evaluation: f64) -> f64 {
    (50.0 + evaluation * 10.0).clamp(0.0, 100.0)
}

pub fn clarity(evaluation: f64) -> Clarity {
    let magnitude = evaluation.abs();
    if magnitude > WINNING_MARGIN {
        Clarity::Beginner
    } else if magnitude > ADVANTAGE_MARGIN {
        Clarity::Intermediate
    } else {
        Clarity::Advanced
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedMove {
    #[serde(rename = "move")]
    pub san: String,
    pub explanation: String,
    pub confidence: f64,
    pub is_capture: bool,
    pub is_tactical: bool,
}

impl SuggestedMove {
    pub fn new(san: String, explanation: String, confidence: f64) -> Self {
        let lowered = explanation.to_lowercase();
        Self {
            is_capture: san.contains('x'),
            is_tactical: lowered.contains("tactic") || lowered.contains("threat"),
            san,
            explanation,
            confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationPoint {
    pub ply: u32,
    pub evaluation: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_move: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub provider: ProviderId,
    pub evaluation: f64,
    pub position_type: PositionType,
    pub equality_percentage: f64,
    pub difficulty: Clarity,
    pub suggested_moves: Vec<SuggestedMove>,
    pub key_points: Vec<String>,
    pub detailed_analysis: String,
    pub confidence: f64,
    pub evaluation_history: Vec<EvaluationPoint>,
    pub threats: Vec<Threat>,
    pub positional_factors: Vec<PositionalFactor>,
    /// Set on the locally built stand-in used when no analysis could be fetched.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unavailable: bool,
}

/// Provider output after parsing and legality filtering, before derivation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedAnalysis {
    pub evaluation: f64,
    pub position_type: Option<String>,
    /// (SAN, explanation) pairs, legal in the analysed position.
    pub suggested_moves: Vec<(String, String)>,
    pub key_points: Vec<String>,
    pub detailed_analysis: String,
}

/// Ply number reported in the evaluation history for `position`.
pub fn history_ply(position: &Position) -> u32 {
    let offset = if position.turn() == Side::White { 1 } else { 0 };
    position
        .fullmove_number()
        .saturating_mul(2)
        .saturating_sub(offset)
}

impl Analysis {
    /// Assemble an analysis from parsed provider fields plus local heuristics.
    pub fn assemble(
        provider: ProviderId,
        position: &Position,
        parsed: ParsedAnalysis,
        confidence: f64,
    ) -> Self {
        let evaluation = clamp_evaluation(parsed.evaluation);
        let position_type = parsed
            .position_type
            .as_deref()
            .and_then(PositionType::from_label)
            .unwrap_or_else(|| PositionType::from_evaluation(evaluation));
        let suggested_moves: Vec<SuggestedMove> = parsed
            .suggested_moves
            .into_iter()
            .map(|(san, explanation)| SuggestedMove::new(san, explanation, confidence))
            .collect();
        let best_move = suggested_moves.first().map(|m| m.san.clone());

        Self {
            provider,
            evaluation,
            position_type,
            equality_percentage: equality_percentage(evaluation),
            difficulty: clarity(evaluation),
            suggested_moves,
            key_points: parsed.key_points,
            detailed_analysis: parsed.detailed_analysis,
            confidence,
            evaluation_history: vec![EvaluationPoint {
                ply: history_ply(position),
                evaluation,
                best_move,
            }],
            threats: heuristics::threats(position),
            positional_factors: heuristics::positional_factors(position),
            unavailable: false,
        }
    }

    /// Neutral stand-in carrying only local heuristics.
    pub fn placeholder(provider: ProviderId, position: &Position) -> Self {
        Self {
            provider,
            evaluation: 0.0,
            position_type: PositionType::Equal,
            equality_percentage: equality_percentage(0.0),
            difficulty: Clarity::Intermediate,
            suggested_moves: Vec::new(),
            key_points: Vec::new(),
            detailed_analysis: "Analysis not available".into(),
            confidence: 0.0,
            evaluation_history: Vec::new(),
            threats: heuristics::threats(position),
            positional_factors: heuristics::positional_factors(position),
            unavailable: true,
        }
    }
}
