//! Cheap local position heuristics.
//!
//! Nothing here searches. These are static board counts that ground an AI
//! analysis with facts the rules engine can vouch for.

use serde::{Deserialize, Serialize};
use shakmaty::{Color, File, Piece, Position as _, Rank, Role, Square};

use crate::position::{side_name, Position, Side};

const CENTER: [Square; 4] = [Square::D4, Square::E4, Square::D5, Square::E5];

const PAWN_ON_HOME_RANK: f64 = 0.1;
const MINOR_ON_HOME_RANK: f64 = 0.5;
const DOUBLED_PAWN: f64 = 0.3;
const ISOLATED_PAWN: f64 = 0.2;

/// Threshold for calling a pawn structure healthier for one side.
const PAWN_STRUCTURE_MARGIN: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionalFactor {
    pub category: String,
    pub evaluation: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Threat {
    #[serde(with = "side_name")]
    pub side: Side,
    pub description: String,
    pub moves: Vec<String>,
}

/// Occupancy of d4/e4/d5/e5: +1 per white piece, -1 per black piece.
pub fn center_control(position: &Position) -> f64 {
    let board = position.chess().board();
    CENTER
        .iter()
        .filter_map(|sq| board.piece_at(*sq))
        .map(|piece| sign(piece.color))
        .sum()
}

/// Penalises pieces still sitting at home. Negative favours Black.
pub fn development(position: &Position) -> f64 {
    let board = position.chess().board();
    let mut score = 0.0;
    for file in File::ALL {
        let home = |rank: Rank| board.piece_at(Square::from_coords(file, rank));
        score -= home_penalty(home(Rank::Second), home(Rank::First), Color::White);
        score += home_penalty(home(Rank::Seventh), home(Rank::Eighth), Color::Black);
    }
    round2(score)
}

fn home_penalty(pawn_rank: Option<Piece>, back_rank: Option<Piece>, color: Color) -> f64 {
    let mut penalty = 0.0;
    if pawn_rank == Some(Piece { color, role: Role::Pawn }) {
        penalty += PAWN_ON_HOME_RANK;
    }
    if let Some(piece) = back_rank {
        if piece.color == color && matches!(piece.role, Role::Knight | Role::Bishop) {
            penalty += MINOR_ON_HOME_RANK;
        }
    }
    penalty
}

/// Doubled and isolated pawns, scored against the side that has them.
pub fn pawn_structure(position: &Position) -> f64 {
    let board = position.chess().board();
    let counts = |color: Color| -> [u32; 8] {
        let mut per_file = [0u32; 8];
        for (i, file) in File::ALL.into_iter().enumerate() {
            per_file[i] = Rank::ALL
                .into_iter()
                .filter(|rank| {
                    board.piece_at(Square::from_coords(file, *rank))
                        == Some(Piece { color, role: Role::Pawn })
                })
                .count() as u32;
        }
        per_file
    };

    let mut score = 0.0;
    for color in [Color::White, Color::Black] {
        let per_file = counts(color);
        let mut penalty = 0.0;
        for (i, &n) in per_file.iter().enumerate() {
            if n > 1 {
                penalty += DOUBLED_PAWN;
            }
            let left = if i > 0 { per_file[i - 1] } else { 0 };
            let right = if i < 7 { per_file[i + 1] } else { 0 };
            if n > 0 && left == 0 && right == 0 {
                penalty += ISOLATED_PAWN * f64::from(n);
            }
        }
        score -= sign(color) * penalty;
    }
    round2(score)
}

pub fn positional_factors(position: &Position) -> Vec<PositionalFactor> {
    let center = center_control(position);
    let dev = development(position);
    let pawns = pawn_structure(position);

    vec![
        PositionalFactor {
            category: "Center Control".into(),
            evaluation: center,
            description: lean(
                center,
                "White controls more central squares",
                "Black controls more central squares",
                "Central control is balanced",
            ),
        },
        PositionalFactor {
            category: "Development".into(),
            evaluation: dev,
            description: lean(
                dev,
                "White has better piece development",
                "Black has better piece development",
                "Development is even",
            ),
        },
        PositionalFactor {
            category: "Pawn Structure".into(),
            evaluation: pawns,
            description: describe_pawn_structure(pawns).into(),
        },
    ]
}

fn lean(score: f64, white: &str, black: &str, even: &str) -> String {
    if score > 0.0 {
        white.into()
    } else if score < 0.0 {
        black.into()
    } else {
        even.into()
    }
}

fn describe_pawn_structure(score: f64) -> &'static str {
    if score > PAWN_STRUCTURE_MARGIN {
        "White has a healthier pawn structure"
    } else if score < -PAWN_STRUCTURE_MARGIN {
        "Black has a healthier pawn structure"
    } else {
        "Balanced pawn structure"
    }
}

/// Immediate tactical features of the position.
///
/// Captures and checks belong to the side to move. Undefended pieces of the
/// side to move that the opponent attacks are reported as the opponent's
/// threats.
pub fn threats(position: &Position) -> Vec<Threat> {
    let mover = position.turn();
    let legal = position.legal_moves();
    let mut out = Vec::new();

    let captures: Vec<String> = legal
        .iter()
        .filter(|m| m.is_capture)
        .map(|m| m.san.clone())
        .collect();
    if !captures.is_empty() {
        out.push(Threat {
            side: mover,
            description: "Immediate capture available".into(),
            moves: captures,
        });
    }

    let checks: Vec<String> = legal.iter().filter(|m| m.is_check).map(|m| m.san.clone()).collect();
    if !checks.is_empty() {
        out.push(Threat {
            side: mover,
            description: "Check available".into(),
            moves: checks,
        });
    }

    let board = position.chess().board();
    let occupied = board.occupied();
    let own = mover.color();
    for sq in board.by_color(own) {
        let Some(piece) = board.piece_at(sq) else { continue };
        if piece.role == Role::King {
            continue;
        }
        let attackers = board.attacks_to(sq, !own, occupied);
        if attackers.is_empty() || board.attacks_to(sq, own, occupied).any() {
            continue;
        }
        out.push(Threat {
            side: mover.opposite(),
            description: format!("{} on {} is attacked and undefended", role_name(piece.role), sq),
            moves: attackers.into_iter().map(|from| format!("{from}{sq}")).collect(),
        });
    }

    out
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::Pawn => "Pawn",
        Role::Knight => "Knight",
        Role::Bishop => "Bishop",
        Role::Rook => "Rook",
        Role::Queen => "Queen",
        Role::King => "King",
    }
}

fn sign(color: Color) -> f64 {
    match color {
        Color::White => 1.0,
        Color::Black => -1.0,
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::MoveSpec;

    fn after(ucis: &[&str]) -> Position {
        ucis.iter().fold(Position::starting(), |pos, uci| {
            pos.play(&MoveSpec::from_uci(uci).unwrap()).unwrap().1
        })
    }

    #[test]
    fn test_starting_position_is_balanced() {
        let pos = Position::starting();
        assert_eq!(center_control(&pos), 0.0);
        assert_eq!(development(&pos), 0.0);
        assert_eq!(pawn_structure(&pos), 0.0);
        assert!(threats(&pos).is_empty());
    }

    #[test]
    fn test_center_and_development_after_e4() {
        let pos = after(&["e2e4"]);
        assert_eq!(center_control(&pos), 1.0);
        assert_eq!(development(&pos), 0.1);

        let factors = positional_factors(&pos);
        assert_eq!(factors[0].description, "White controls more central squares");
        assert_eq!(factors[1].description, "White has better piece development");
    }

    #[test]
    fn test_doubled_pawns_penalised() {
        // White pawns doubled on the e-file, both e-pawns still backed by d/f.
        let pos = Position::from_fen("4k3/pppppppp/8/8/8/4P3/PPPPPPP1/4K3 w - - 0 1").unwrap();
        assert_eq!(pawn_structure(&pos), -0.3);
    }

    #[test]
    fn test_isolated_pawn_penalised() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/P7/4K3 w - - 0 1").unwrap();
        assert_eq!(pawn_structure(&pos), -0.2);
    }

    #[test]
    fn test_capture_and_check_threats_are_separate() {
        // 1.e4 d5: exd5 is a capture; Bb5+ is a check.
        let pos = after(&["e2e4", "d7d5"]);
        let found = threats(&pos);

        let captures = found.iter().find(|t| t.description.contains("capture")).unwrap();
        assert_eq!(captures.side, Side::White);
        assert_eq!(captures.moves, vec!["exd5".to_string()]);

        let checks = found.iter().find(|t| t.description.contains("Check")).unwrap();
        assert_eq!(checks.moves, vec!["Bb5+".to_string()]);
    }

    #[test]
    fn test_hanging_piece_reported_for_opponent() {
        // White to move, knight on e5 attacked by the d6 pawn with nothing defending it.
        let pos = Position::from_fen("4k3/8/3p4/4N3/8/8/8/4K3 w - - 0 1").unwrap();
        let found = threats(&pos);
        let hanging = found
            .iter()
            .find(|t| t.description.contains("undefended"))
            .unwrap();
        assert_eq!(hanging.side, Side::Black);
        assert_eq!(hanging.moves, vec!["d6e5".to_string()]);
    }

    #[test]
    fn test_threat_serializes_side_name() {
        let threat = Threat {
            side: Side::White,
            description: "x".into(),
            moves: vec![],
        };
        let json = serde_json::to_value(&threat).unwrap();
        assert_eq!(json["side"], "white");
    }
}
