//! Game transitions. Every transition takes a snapshot and returns a new one;
//! nothing here performs I/O.

use tracing::debug;
use uuid::Uuid;

use ai_analysis::{AiMove, Analysis};
use chess_core::{GameLine, MoveSpec, PlayedMove, Side};

use crate::annotations::{Annotation, AnnotationSymbol};
use crate::error::SessionError;
use crate::settings::SettingsPatch;
use crate::snapshot::{Cursor, GameError, GameOver, GameOverReason, GameSnapshot, PendingRequest};

/// Most plies a single undo takes back.
const MAX_UNDO_PLIES: usize = 2;

#[derive(Debug, Clone)]
pub enum GameAction {
    HumanMove(MoveSpec),
    BeginAiTurn,
    AiMoveAccepted {
        token: u64,
        fen: String,
        ai_move: AiMove,
    },
    /// `error: None` means the request was cancelled and nothing is shown.
    AiTurnFailed {
        token: u64,
        error: Option<GameError>,
    },
    Undo,
    Navigate(usize),
    Reset {
        ai_side: Side,
    },
    Tick,
    /// `ai_side` carries the freshly resolved side when the colour changes.
    ChangeSettings {
        patch: SettingsPatch,
        ai_side: Option<Side>,
    },
    AddAnnotation {
        move_index: usize,
        symbol: AnnotationSymbol,
        comment: String,
    },
    UpdateAnnotation {
        id: Uuid,
        symbol: AnnotationSymbol,
        comment: String,
    },
    DeleteAnnotation(Uuid),
    SetError(GameError),
    DismissError,
    Resign,
}

/// Apply `action`, or say why it does not apply.
pub fn try_reduce(snapshot: &GameSnapshot, action: GameAction) -> Result<GameSnapshot, SessionError> {
    let mut next = snapshot.clone();
    match action {
        GameAction::HumanMove(spec) => {
            ensure_playable(&next)?;
            if next.is_ai_turn() {
                return Err(SessionError::NotHumanTurn);
            }
            let played = next
                .live_position()
                .find_move(&spec)
                .ok_or_else(|| SessionError::IllegalMove(format!("{}{}", spec.from, spec.to)))?;
            play(&mut next, played)?;
            next.error = None;
        }

        GameAction::BeginAiTurn => {
            ensure_playable(&next)?;
            if !next.is_ai_turn() {
                return Err(SessionError::NotAiTurn);
            }
            if next.live_position().legal_moves().is_empty() {
                return Err(SessionError::NoLegalMoves);
            }
            next.pending = Some(PendingRequest {
                token: next.next_token,
                fen: next.live_position().fen().to_string(),
            });
            next.next_token += 1;
            next.is_thinking = true;
            next.error = None;
        }

        GameAction::AiMoveAccepted { token, fen, ai_move } => {
            ensure_pending(&next, token)?;
            if next.pending.as_ref().is_some_and(|p| p.fen != fen) || next.live_position().fen() != fen {
                return Err(SessionError::StaleResult);
            }
            let from = next.live_position().clone();
            let analysis = match (ai_move.analysis, ai_move.analysis_error) {
                (Some(analysis), _) => Some(analysis),
                (None, Some(_)) => Some(Analysis::placeholder(next.settings.provider, &from)),
                (None, None) => None,
            };
            next.is_thinking = false;
            next.pending = None;
            play(&mut next, ai_move.played)?;
            next.analysis = analysis;
        }

        GameAction::AiTurnFailed { token, error } => {
            ensure_pending(&next, token)?;
            next.is_thinking = false;
            next.pending = None;
            if error.is_some() {
                next.error = error;
            }
        }

        GameAction::Undo => {
            if next.is_thinking {
                return Err(SessionError::AiThinking);
            }
            if next.line.is_empty() {
                return Err(SessionError::NothingToUndo);
            }
            next.line.pop();
            if next.settings.ai_color.fixed().is_some() {
                let mut popped = 1;
                while popped < MAX_UNDO_PLIES && !next.line.is_empty() && next.is_ai_turn() {
                    next.line.pop();
                    popped += 1;
                }
            }
            let len = next.line.len();
            next.annotations.truncate(len);
            next.analysis = None;
            next.last_move = None;
            next.cursor = None;
            next.error = None;
            if next.game_over.is_some_and(|g| g.reason.is_positional()) {
                next.game_over = None;
            }
        }

        GameAction::Navigate(index) => {
            if next.is_thinking {
                return Err(SessionError::AiThinking);
            }
            let len = next.line.len();
            if index >= len {
                return Err(SessionError::InvalidIndex(index));
            }
            next.cursor = if index + 1 == len {
                None
            } else {
                let replayed = GameLine::replay(next.line.start().clone(), &next.line.sans(), Some(index))
                    .map_err(|e| SessionError::IllegalMove(e.to_string()))?;
                let last_move = replayed
                    .last_move()
                    .cloned()
                    .ok_or(SessionError::InvalidIndex(index))?;
                Some(Cursor {
                    index,
                    position: replayed.current().clone(),
                    last_move,
                    is_draw: replayed.is_draw(),
                })
            };
        }

        GameAction::Reset { ai_side } => {
            let mut fresh = GameSnapshot::new(next.settings.clone(), ai_side);
            fresh.next_token = next.next_token;
            next = fresh;
        }

        GameAction::Tick => {
            if next.game_over.is_some() || next.is_checkmate() || next.is_draw() {
                return Err(SessionError::GameOver);
            }
            if next.is_thinking {
                return Err(SessionError::AiThinking);
            }
            if next.time_white == 0 || next.time_black == 0 {
                return Err(SessionError::GameOver);
            }
            let side = next.turn();
            let clock = next.clock_mut(side);
            *clock -= 1;
            if *clock == 0 {
                next.game_over = Some(GameOver {
                    reason: GameOverReason::Timeout,
                    winner: Some(side.opposite()),
                });
            }
        }

        GameAction::ChangeSettings { patch, ai_side } => {
            if next.is_thinking && (patch.ai_color.is_some() || patch.time_control.is_some()) {
                return Err(SessionError::AiThinking);
            }
            let settings = next.settings.patched(&patch)?;
            if let Some(color) = patch.ai_color {
                next.ai_side = ai_side.or(color.fixed()).unwrap_or(next.ai_side);
            }
            if patch.time_control.is_some() {
                let clock = settings.initial_clock_secs();
                next.time_white = clock;
                next.time_black = clock;
                next.game_over = None;
            }
            next.settings = settings;
        }

        GameAction::AddAnnotation { move_index, symbol, comment } => {
            if move_index >= next.line.len() {
                return Err(SessionError::InvalidAnnotation(format!(
                    "no move at index {move_index}"
                )));
            }
            next.annotations.upsert(Annotation::new(move_index, symbol, comment));
        }

        GameAction::UpdateAnnotation { id, symbol, comment } => {
            next.annotations.update(id, symbol, comment)?;
        }

        GameAction::DeleteAnnotation(id) => {
            next.annotations.remove(id)?;
        }

        GameAction::SetError(error) => {
            next.error = Some(error);
        }

        GameAction::DismissError => {
            next.error = None;
        }

        GameAction::Resign => {
            if next.game_over.is_some() {
                return Err(SessionError::GameOver);
            }
            next.game_over = Some(GameOver {
                reason: GameOverReason::Resignation,
                winner: Some(next.ai_side),
            });
            next.is_thinking = false;
            next.pending = None;
        }
    }
    Ok(next)
}

/// Total version of [`try_reduce`]: a rejected action leaves the snapshot as it was.
pub fn reduce(snapshot: GameSnapshot, action: GameAction) -> GameSnapshot {
    match try_reduce(&snapshot, action) {
        Ok(next) => next,
        Err(e) => {
            debug!(error = %e, "Action rejected");
            snapshot
        }
    }
}

fn ensure_playable(snapshot: &GameSnapshot) -> Result<(), SessionError> {
    if snapshot.is_thinking {
        return Err(SessionError::AiThinking);
    }
    if snapshot.game_over.is_some() {
        return Err(SessionError::GameOver);
    }
    if !snapshot.is_live() {
        return Err(SessionError::NotLive);
    }
    Ok(())
}

fn ensure_pending(snapshot: &GameSnapshot, token: u64) -> Result<(), SessionError> {
    match &snapshot.pending {
        Some(pending) if snapshot.is_thinking && pending.token == token => Ok(()),
        _ => Err(SessionError::StaleResult),
    }
}

/// Append a move for the side to move and settle clocks and outcome.
fn play(snapshot: &mut GameSnapshot, played: PlayedMove) -> Result<(), SessionError> {
    let mover = snapshot.turn();
    snapshot
        .line
        .push(played.clone())
        .map_err(|e| SessionError::IllegalMove(e.to_string()))?;

    let increment = snapshot.settings.increment;
    let clock = snapshot.clock_mut(mover);
    *clock = clock.saturating_add(increment);

    snapshot.last_move = Some(played);
    snapshot.cursor = None;
    snapshot.game_over = outcome(&snapshot.line, mover);
    Ok(())
}

fn outcome(line: &GameLine, mover: Side) -> Option<GameOver> {
    let position = line.current();
    if position.is_checkmate() {
        Some(GameOver {
            reason: GameOverReason::Checkmate,
            winner: Some(mover),
        })
    } else if position.is_stalemate() {
        Some(GameOver {
            reason: GameOverReason::Stalemate,
            winner: None,
        })
    } else if line.is_draw() {
        Some(GameOver {
            reason: GameOverReason::Draw,
            winner: None,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{AiColor, Settings};
    use ai_analysis::{AnalysisError, ProviderId};
    use chess_core::Position;

    fn spec(uci: &str) -> MoveSpec {
        MoveSpec::from_uci(uci).unwrap()
    }

    fn settings(ai_color: AiColor) -> Settings {
        Settings {
            ai_color,
            ..Settings::default()
        }
    }

    /// Human plays White against a Black AI.
    fn vs_black() -> GameSnapshot {
        GameSnapshot::new(settings(AiColor::Black), Side::Black)
    }

    fn ai_move(position: &Position, uci: &str) -> AiMove {
        let played = position.find_move(&spec(uci)).unwrap();
        AiMove {
            played,
            explanation: "test".into(),
            analysis: None,
            analysis_error: None,
            fallback: false,
        }
    }

    /// Run a full AI turn that plays `uci`.
    fn ai_reply(snapshot: GameSnapshot, uci: &str) -> GameSnapshot {
        let begun = try_reduce(&snapshot, GameAction::BeginAiTurn).unwrap();
        let pending = begun.pending.clone().unwrap();
        let mv = ai_move(begun.live_position(), uci);
        try_reduce(
            &begun,
            GameAction::AiMoveAccepted {
                token: pending.token,
                fen: pending.fen,
                ai_move: mv,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_human_move_matches_rules_engine() {
        let snap = vs_black();
        let next = try_reduce(&snap, GameAction::HumanMove(spec("e2e4"))).unwrap();

        let (_, expected) = Position::starting().play(&spec("e2e4")).unwrap();
        assert_eq!(next.live_position(), &expected);
        assert_eq!(next.line.sans(), vec!["e4"]);
        assert_eq!(next.last_move.as_ref().unwrap().san, "e4");
        assert!(next.wants_ai_move());
    }

    #[test]
    fn test_illegal_move_is_a_no_op() {
        let snap = vs_black();
        let err = try_reduce(&snap, GameAction::HumanMove(spec("e2e5"))).unwrap_err();
        assert!(matches!(err, SessionError::IllegalMove(_)));
        assert_eq!(reduce(snap.clone(), GameAction::HumanMove(spec("e2e5"))), snap);
    }

    #[test]
    fn test_human_cannot_move_for_ai() {
        let snap = GameSnapshot::new(settings(AiColor::White), Side::White);
        assert_eq!(
            try_reduce(&snap, GameAction::HumanMove(spec("e2e4"))).unwrap_err(),
            SessionError::NotHumanTurn
        );
    }

    #[test]
    fn test_thinking_blocks_human_input() {
        let snap = try_reduce(&vs_black(), GameAction::HumanMove(spec("e2e4"))).unwrap();
        let thinking = try_reduce(&snap, GameAction::BeginAiTurn).unwrap();
        assert!(thinking.is_thinking);
        assert_eq!(
            try_reduce(&thinking, GameAction::HumanMove(spec("d2d4"))).unwrap_err(),
            SessionError::AiThinking
        );
        assert_eq!(try_reduce(&thinking, GameAction::BeginAiTurn).unwrap_err(), SessionError::AiThinking);
        assert_eq!(try_reduce(&thinking, GameAction::Undo).unwrap_err(), SessionError::AiThinking);
    }

    #[test]
    fn test_e4_then_ai_reply() {
        let snap = try_reduce(&vs_black(), GameAction::HumanMove(spec("e2e4"))).unwrap();
        let next = ai_reply(snap, "e7e5");
        assert_eq!(next.line.sans(), vec!["e4", "e5"]);
        assert!(!next.is_thinking);
        assert!(next.pending.is_none());
        assert_eq!(next.turn(), Side::White);
    }

    #[test]
    fn test_stale_completion_discarded() {
        let snap = try_reduce(&vs_black(), GameAction::HumanMove(spec("e2e4"))).unwrap();
        let begun = try_reduce(&snap, GameAction::BeginAiTurn).unwrap();
        let pending = begun.pending.clone().unwrap();
        let mv = ai_move(begun.live_position(), "e7e5");

        let wrong_token = GameAction::AiMoveAccepted {
            token: pending.token + 1,
            fen: pending.fen.clone(),
            ai_move: mv.clone(),
        };
        assert_eq!(try_reduce(&begun, wrong_token).unwrap_err(), SessionError::StaleResult);

        let reset = try_reduce(&begun, GameAction::Reset { ai_side: Side::Black }).unwrap();
        let late = GameAction::AiMoveAccepted {
            token: pending.token,
            fen: pending.fen,
            ai_move: mv,
        };
        assert_eq!(try_reduce(&reset, late).unwrap_err(), SessionError::StaleResult);
        assert!(reset.next_token > pending.token);
    }

    #[test]
    fn test_failed_turn_populates_error() {
        let snap = try_reduce(&vs_black(), GameAction::HumanMove(spec("e2e4"))).unwrap();
        let begun = try_reduce(&snap, GameAction::BeginAiTurn).unwrap();
        let token = begun.pending.as_ref().unwrap().token;
        let error = GameError::from_analysis(ProviderId::Gpt4, &AnalysisError::RateLimited("slow down".into()));

        let failed = try_reduce(&begun, GameAction::AiTurnFailed { token, error: Some(error) }).unwrap();
        assert!(!failed.is_thinking);
        assert!(failed.error.as_ref().unwrap().retryable);
        assert_eq!(failed.line.len(), 1);

        let dismissed = try_reduce(&failed, GameAction::DismissError).unwrap();
        assert!(dismissed.error.is_none());
    }

    #[test]
    fn test_cancelled_turn_is_silent() {
        let snap = try_reduce(&vs_black(), GameAction::HumanMove(spec("e2e4"))).unwrap();
        let begun = try_reduce(&snap, GameAction::BeginAiTurn).unwrap();
        let token = begun.pending.as_ref().unwrap().token;
        let cleared = try_reduce(&begun, GameAction::AiTurnFailed { token, error: None }).unwrap();
        assert!(!cleared.is_thinking);
        assert!(cleared.error.is_none());
    }

    #[test]
    fn test_analysis_failure_attaches_placeholder() {
        let snap = try_reduce(&vs_black(), GameAction::HumanMove(spec("e2e4"))).unwrap();
        let begun = try_reduce(&snap, GameAction::BeginAiTurn).unwrap();
        let pending = begun.pending.clone().unwrap();
        let mut mv = ai_move(begun.live_position(), "c7c5");
        mv.analysis_error = Some(AnalysisError::AnalysisTimeout(30));

        let next = try_reduce(
            &begun,
            GameAction::AiMoveAccepted {
                token: pending.token,
                fen: pending.fen,
                ai_move: mv,
            },
        )
        .unwrap();
        let analysis = next.analysis.unwrap();
        assert!(analysis.unavailable);
        assert_eq!(analysis.evaluation, 0.0);
        assert_eq!(next.line.sans(), vec!["e4", "c5"]);
    }

    #[test]
    fn test_undo_takes_back_the_pair() {
        let snap = try_reduce(&vs_black(), GameAction::HumanMove(spec("e2e4"))).unwrap();
        let snap = ai_reply(snap, "e7e5");
        let undone = try_reduce(&snap, GameAction::Undo).unwrap();
        assert!(undone.line.is_empty());
        assert!(undone.last_move.is_none());

        // Human Black: [e4, e5, Nf3] undoes back to the human's own turn after e4.
        let snap = GameSnapshot::new(settings(AiColor::White), Side::White);
        let snap = ai_reply(snap, "e2e4");
        let snap = try_reduce(&snap, GameAction::HumanMove(spec("e7e5"))).unwrap();
        let snap = ai_reply(snap, "g1f3");
        let undone = try_reduce(&snap, GameAction::Undo).unwrap();
        assert_eq!(undone.line.sans(), vec!["e4"]);
        assert_eq!(undone.turn(), Side::Black);
    }

    #[test]
    fn test_undo_is_floored_at_zero() {
        let snap = vs_black();
        assert_eq!(try_reduce(&snap, GameAction::Undo).unwrap_err(), SessionError::NothingToUndo);
        assert_eq!(reduce(snap.clone(), GameAction::Undo), snap);
    }

    #[test]
    fn test_undo_left_inverse_on_length() {
        let mut snap = vs_black();
        for (human, ai) in [("e2e4", "e7e5"), ("g1f3", "b8c6"), ("f1c4", "f8c5")] {
            let before = snap.line.len();
            snap = try_reduce(&snap, GameAction::HumanMove(spec(human))).unwrap();
            snap = ai_reply(snap, ai);
            let undone = try_reduce(&snap, GameAction::Undo).unwrap();
            assert_eq!(undone.line.len(), before);
        }
    }

    #[test]
    fn test_undo_drops_annotations_past_history() {
        let mut snap = try_reduce(&vs_black(), GameAction::HumanMove(spec("e2e4"))).unwrap();
        snap = ai_reply(snap, "e7e5");
        snap = try_reduce(&snap, GameAction::HumanMove(spec("g1f3"))).unwrap();
        snap = ai_reply(snap, "b8c6");
        for i in 0..4 {
            snap = try_reduce(
                &snap,
                GameAction::AddAnnotation {
                    move_index: i,
                    symbol: AnnotationSymbol::Good,
                    comment: String::new(),
                },
            )
            .unwrap();
        }

        let undone = try_reduce(&snap, GameAction::Undo).unwrap();
        assert_eq!(undone.line.len(), 2);
        let kept: Vec<usize> = undone.annotations.iter().map(|a| a.move_index).collect();
        assert_eq!(kept, vec![0, 1]);
    }

    #[test]
    fn test_annotation_needs_existing_move() {
        let snap = try_reduce(&vs_black(), GameAction::HumanMove(spec("e2e4"))).unwrap();
        let bad = GameAction::AddAnnotation {
            move_index: 1,
            symbol: AnnotationSymbol::Blunder,
            comment: String::new(),
        };
        assert!(matches!(try_reduce(&snap, bad), Err(SessionError::InvalidAnnotation(_))));
    }

    #[test]
    fn test_navigate_and_return_live() {
        let mut snap = try_reduce(&vs_black(), GameAction::HumanMove(spec("e2e4"))).unwrap();
        snap = ai_reply(snap, "e7e5");
        snap = try_reduce(&snap, GameAction::HumanMove(spec("g1f3"))).unwrap();
        snap = ai_reply(snap, "b8c6");

        let viewed = try_reduce(&snap, GameAction::Navigate(0)).unwrap();
        let after_e4 = Position::starting().play(&spec("e2e4")).unwrap().1;
        assert_eq!(viewed.position(), &after_e4);
        assert_eq!(viewed.line, snap.line);
        assert_eq!(
            try_reduce(&viewed, GameAction::HumanMove(spec("d2d4"))).unwrap_err(),
            SessionError::NotLive
        );

        let live = try_reduce(&viewed, GameAction::Navigate(3)).unwrap();
        assert!(live.is_live());
        assert_eq!(live.position(), snap.live_position());
        assert_eq!(try_reduce(&snap, GameAction::Navigate(4)).unwrap_err(), SessionError::InvalidIndex(4));
    }

    #[test]
    fn test_navigated_view_reports_viewed_position() {
        let mut snap = try_reduce(&vs_black(), GameAction::HumanMove(spec("e2e4"))).unwrap();
        snap = ai_reply(snap, "d7d6");
        snap = try_reduce(&snap, GameAction::HumanMove(spec("f1b5"))).unwrap();
        snap = ai_reply(snap, "c7c6");

        let viewed = try_reduce(&snap, GameAction::Navigate(2)).unwrap();
        let view = viewed.view();
        assert!(view.is_check);
        assert!(!view.is_checkmate);
        assert!(!view.is_draw);
        assert_eq!(view.turn, Side::Black);
        assert_eq!(view.move_number, 2);
        assert_eq!(view.last_move.unwrap().san, "Bb5+");
        assert_eq!(view.cursor, Some(2));
        assert_eq!(view.live_fen, snap.live_position().fen());

        let live = snap.view();
        assert!(!live.is_check);
        assert_eq!(live.turn, Side::White);
        assert_eq!(live.last_move.unwrap().san, "c6");
    }

    #[test]
    fn test_increment_credited_to_mover() {
        let mut snap = vs_black();
        snap.settings.increment = 5;
        let next = try_reduce(&snap, GameAction::HumanMove(spec("e2e4"))).unwrap();
        assert_eq!(next.time_white, 605);
        assert_eq!(next.time_black, 600);
    }

    #[test]
    fn test_tick_counts_down_active_side() {
        let snap = vs_black();
        let next = try_reduce(&snap, GameAction::Tick).unwrap();
        assert_eq!(next.time_white, 599);
        assert_eq!(next.time_black, 600);
    }

    #[test]
    fn test_timeout_ends_game_and_freezes_clocks() {
        let mut snap = vs_black();
        snap.time_white = 1;
        let over = try_reduce(&snap, GameAction::Tick).unwrap();
        assert_eq!(over.time_white, 0);
        assert_eq!(
            over.game_over,
            Some(GameOver {
                reason: GameOverReason::Timeout,
                winner: Some(Side::Black),
            })
        );

        let frozen = reduce(over.clone(), GameAction::Tick);
        assert_eq!(frozen.time_white, 0);
        assert_eq!(frozen.time_black, 600);
        assert_eq!(try_reduce(&over, GameAction::HumanMove(spec("e2e4"))).unwrap_err(), SessionError::GameOver);
    }

    #[test]
    fn test_tick_paused_while_thinking() {
        let snap = try_reduce(&vs_black(), GameAction::HumanMove(spec("e2e4"))).unwrap();
        let thinking = try_reduce(&snap, GameAction::BeginAiTurn).unwrap();
        assert_eq!(try_reduce(&thinking, GameAction::Tick).unwrap_err(), SessionError::AiThinking);
    }

    #[test]
    fn test_checkmate_ends_game() {
        // Fool's mate with the human as Black.
        let mut snap = GameSnapshot::new(settings(AiColor::White), Side::White);
        snap = ai_reply(snap, "f2f3");
        snap = try_reduce(&snap, GameAction::HumanMove(spec("e7e5"))).unwrap();
        snap = ai_reply(snap, "g2g4");
        snap = try_reduce(&snap, GameAction::HumanMove(spec("d8h4"))).unwrap();

        assert_eq!(
            snap.game_over,
            Some(GameOver {
                reason: GameOverReason::Checkmate,
                winner: Some(Side::Black),
            })
        );
        assert!(!snap.wants_ai_move());
        assert_eq!(try_reduce(&snap, GameAction::Tick).unwrap_err(), SessionError::GameOver);

        let undone = try_reduce(&snap, GameAction::Undo).unwrap();
        assert!(undone.game_over.is_none());
    }

    #[test]
    fn test_time_control_change_resets_clocks() {
        let mut snap = vs_black();
        snap.time_white = 0;
        snap.game_over = Some(GameOver {
            reason: GameOverReason::Timeout,
            winner: Some(Side::Black),
        });
        let patch = SettingsPatch {
            time_control: Some(5),
            ..Default::default()
        };
        let next = try_reduce(&snap, GameAction::ChangeSettings { patch, ai_side: None }).unwrap();
        assert_eq!(next.time_white, 300);
        assert_eq!(next.time_black, 300);
        assert!(next.game_over.is_none());
    }

    #[test]
    fn test_colour_change_switches_ai_side() {
        let snap = vs_black();
        let patch = SettingsPatch {
            ai_color: Some(AiColor::White),
            ..Default::default()
        };
        let next = try_reduce(&snap, GameAction::ChangeSettings { patch, ai_side: None }).unwrap();
        assert_eq!(next.ai_side, Side::White);
        assert!(next.wants_ai_move());

        let bad = SettingsPatch {
            difficulty: Some(0),
            ..Default::default()
        };
        assert!(try_reduce(&next, GameAction::ChangeSettings { patch: bad, ai_side: None }).is_err());
    }

    #[test]
    fn test_reset_keeps_settings() {
        let mut snap = try_reduce(&vs_black(), GameAction::HumanMove(spec("e2e4"))).unwrap();
        snap.settings.provider = ProviderId::Gemini;
        let fresh = try_reduce(&snap, GameAction::Reset { ai_side: Side::White }).unwrap();
        assert!(fresh.line.is_empty());
        assert_eq!(fresh.settings.provider, ProviderId::Gemini);
        assert_eq!(fresh.ai_side, Side::White);
        assert!(fresh.annotations.is_empty());
    }

    #[test]
    fn test_resign() {
        let snap = try_reduce(&vs_black(), GameAction::HumanMove(spec("e2e4"))).unwrap();
        let resigned = try_reduce(&snap, GameAction::Resign).unwrap();
        assert_eq!(
            resigned.game_over,
            Some(GameOver {
                reason: GameOverReason::Resignation,
                winner: Some(Side::Black),
            })
        );
        assert_eq!(try_reduce(&resigned, GameAction::Resign).unwrap_err(), SessionError::GameOver);
        let undone = try_reduce(&resigned, GameAction::Undo).unwrap();
        assert!(undone.game_over.is_some());
    }
}
