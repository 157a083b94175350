//! One live game: its snapshot behind an async mutex plus the AI turn driver.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use ai_analysis::service::fallback_move;
use ai_analysis::{AnalysisError, AnalysisService, ProviderGateway, ProviderId};
use chess_core::{MoveSpec, Position};

use crate::annotations::AnnotationSymbol;
use crate::error::SessionError;
use crate::reducer::{try_reduce, GameAction};
use crate::settings::{Settings, SettingsPatch};
use crate::snapshot::{GameError, GameSnapshot, PendingRequest};

/// A transition's result and the AI turn it started, if any.
#[derive(Debug)]
pub struct SessionUpdate {
    pub snapshot: GameSnapshot,
    pub ai_turn: Option<JoinHandle<()>>,
}

pub struct GameSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    state: Mutex<GameSnapshot>,
    service: AnalysisService,
}

/// Everything a spawned AI turn needs, captured while the lock is held.
struct AiTurnRequest {
    pending: PendingRequest,
    position: Position,
    provider: ProviderId,
    difficulty: u8,
}

impl AiTurnRequest {
    fn from_snapshot(snapshot: &GameSnapshot) -> Option<Self> {
        let pending = snapshot.pending.clone()?;
        Some(Self {
            pending,
            position: snapshot.live_position().clone(),
            provider: snapshot.settings.provider,
            difficulty: snapshot.settings.difficulty,
        })
    }
}

impl GameSession {
    pub fn new(settings: Settings, gateway: Arc<ProviderGateway>) -> Result<Arc<Self>, SessionError> {
        Self::with_service(settings, AnalysisService::new(gateway))
    }

    pub fn with_service(settings: Settings, service: AnalysisService) -> Result<Arc<Self>, SessionError> {
        settings.validate()?;
        let ai_side = settings.ai_color.resolve(&mut rand::rng());
        let id = Uuid::new_v4();
        info!(game_id = %id, ai_side = %ai_side, provider = %settings.provider, "Game created");
        Ok(Arc::new(Self {
            id,
            created_at: Utc::now(),
            state: Mutex::new(GameSnapshot::new(settings, ai_side)),
            service,
        }))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub async fn snapshot(&self) -> GameSnapshot {
        self.state.lock().await.clone()
    }

    /// Apply one transition without starting anything.
    async fn apply(&self, action: GameAction) -> Result<GameSnapshot, SessionError> {
        let mut state = self.state.lock().await;
        let next = try_reduce(&state, action)?;
        *state = next.clone();
        Ok(next)
    }

    /// Apply `action` (if any) and, when the AI is now to move, begin its
    /// turn under the same lock.
    async fn apply_and_continue(
        self: &Arc<Self>,
        action: Option<GameAction>,
    ) -> Result<SessionUpdate, SessionError> {
        let mut state = self.state.lock().await;
        let mut next = match action {
            Some(action) => try_reduce(&state, action)?,
            None => state.clone(),
        };

        let mut request = None;
        if next.wants_ai_move() {
            match try_reduce(&next, GameAction::BeginAiTurn) {
                Ok(begun) => {
                    request = AiTurnRequest::from_snapshot(&begun);
                    next = begun;
                }
                Err(e) => debug!(game_id = %self.id, error = %e, "AI turn not started"),
            }
        }
        *state = next.clone();
        drop(state);

        let ai_turn = request.map(|request| self.spawn_ai_turn(request));
        Ok(SessionUpdate {
            snapshot: next,
            ai_turn,
        })
    }

    fn spawn_ai_turn(self: &Arc<Self>, request: AiTurnRequest) -> JoinHandle<()> {
        let session = Arc::clone(self);
        tokio::spawn(async move { session.run_ai_turn(request).await })
    }

    /// Ask the provider for a move and feed the result back through the
    /// reducer. The lock is not held while waiting on the provider.
    async fn run_ai_turn(&self, request: AiTurnRequest) {
        let AiTurnRequest {
            pending,
            position,
            provider,
            difficulty,
        } = request;
        debug!(game_id = %self.id, token = pending.token, fen = %pending.fen, "AI turn started");

        let result = self.service.suggest_move(&position, provider, difficulty).await;

        let mut state = self.state.lock().await;
        let action = match result {
            Ok(ai_move) => GameAction::AiMoveAccepted {
                token: pending.token,
                fen: pending.fen,
                ai_move,
            },
            Err(AnalysisError::Cancelled) => GameAction::AiTurnFailed {
                token: pending.token,
                error: None,
            },
            Err(e) => {
                warn!(game_id = %self.id, provider = %provider, error = %e, "AI turn failed");
                GameAction::AiTurnFailed {
                    token: pending.token,
                    error: Some(GameError::from_analysis(provider, &e)),
                }
            }
        };

        match try_reduce(&state, action) {
            Ok(next) => {
                if let Some(mv) = next.last_move.as_ref().filter(|_| next.line.len() > state.line.len()) {
                    info!(game_id = %self.id, san = %mv.san, "AI move applied");
                }
                *state = next;
            }
            Err(SessionError::StaleResult) => {
                debug!(game_id = %self.id, token = pending.token, "Discarding stale AI result");
            }
            Err(e) => {
                warn!(game_id = %self.id, error = %e, "AI move rejected");
                let error = GameError::from_analysis(provider, &AnalysisError::InvalidMoveFormat(e.to_string()));
                let failed = GameAction::AiTurnFailed {
                    token: pending.token,
                    error: Some(error),
                };
                if let Ok(next) = try_reduce(&state, failed) {
                    *state = next;
                }
            }
        }
    }

    /// Start the AI's turn if it is the AI to move and nothing is running.
    pub async fn resume(self: &Arc<Self>) -> SessionUpdate {
        match self.apply_and_continue(None).await {
            Ok(update) => update,
            Err(_) => SessionUpdate {
                snapshot: self.snapshot().await,
                ai_turn: None,
            },
        }
    }

    pub async fn human_move(self: &Arc<Self>, spec: MoveSpec) -> Result<SessionUpdate, SessionError> {
        self.apply_and_continue(Some(GameAction::HumanMove(spec))).await
    }

    /// Explicitly request an AI turn, e.g. to retry after a failure.
    pub async fn request_ai_move(self: &Arc<Self>) -> Result<SessionUpdate, SessionError> {
        let mut state = self.state.lock().await;
        let begun = try_reduce(&state, GameAction::BeginAiTurn)?;
        let request = AiTurnRequest::from_snapshot(&begun);
        *state = begun.clone();
        drop(state);

        Ok(SessionUpdate {
            snapshot: begun,
            ai_turn: request.map(|r| self.spawn_ai_turn(r)),
        })
    }

    /// Play a random legal move for the AI, labelled as a fallback.
    pub async fn fallback_move(&self) -> Result<GameSnapshot, SessionError> {
        let mut state = self.state.lock().await;
        let begun = try_reduce(&state, GameAction::BeginAiTurn)?;
        let pending = begun.pending.clone().ok_or(SessionError::StaleResult)?;
        let ai_move = fallback_move(begun.live_position()).ok_or(SessionError::NoLegalMoves)?;
        info!(game_id = %self.id, san = %ai_move.played.san, "Fallback move played");

        let next = try_reduce(
            &begun,
            GameAction::AiMoveAccepted {
                token: pending.token,
                fen: pending.fen,
                ai_move,
            },
        )?;
        *state = next.clone();
        Ok(next)
    }

    pub async fn undo(self: &Arc<Self>) -> Result<SessionUpdate, SessionError> {
        self.apply_and_continue(Some(GameAction::Undo)).await
    }

    /// Start over with the same settings. Any running AI turn is cancelled.
    pub async fn reset(self: &Arc<Self>) -> Result<SessionUpdate, SessionError> {
        self.service.cancel();
        let ai_side = {
            let state = self.state.lock().await;
            state.settings.ai_color.resolve(&mut rand::rng())
        };
        info!(game_id = %self.id, ai_side = %ai_side, "Game reset");
        self.apply_and_continue(Some(GameAction::Reset { ai_side })).await
    }

    pub async fn navigate(&self, index: usize) -> Result<GameSnapshot, SessionError> {
        self.apply(GameAction::Navigate(index)).await
    }

    pub async fn update_settings(self: &Arc<Self>, patch: SettingsPatch) -> Result<SessionUpdate, SessionError> {
        let ai_side = patch.ai_color.map(|color| color.resolve(&mut rand::rng()));
        self.apply_and_continue(Some(GameAction::ChangeSettings { patch, ai_side }))
            .await
    }

    pub async fn tick(&self) -> Result<GameSnapshot, SessionError> {
        self.apply(GameAction::Tick).await
    }

    pub async fn add_annotation(
        &self,
        move_index: usize,
        symbol: AnnotationSymbol,
        comment: String,
    ) -> Result<GameSnapshot, SessionError> {
        self.apply(GameAction::AddAnnotation {
            move_index,
            symbol,
            comment,
        })
        .await
    }

    pub async fn update_annotation(
        &self,
        id: Uuid,
        symbol: AnnotationSymbol,
        comment: String,
    ) -> Result<GameSnapshot, SessionError> {
        self.apply(GameAction::UpdateAnnotation { id, symbol, comment }).await
    }

    pub async fn delete_annotation(&self, id: Uuid) -> Result<GameSnapshot, SessionError> {
        self.apply(GameAction::DeleteAnnotation(id)).await
    }

    pub async fn dismiss_error(&self) -> Result<GameSnapshot, SessionError> {
        self.apply(GameAction::DismissError).await
    }

    pub async fn resign(&self) -> Result<GameSnapshot, SessionError> {
        self.service.cancel();
        self.apply(GameAction::Resign).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::AiColor;
    use ai_analysis::provider::ProviderBackend;
    use ai_analysis::scripted::ScriptedBackend;
    use chess_core::Side;
    use std::time::Duration;

    const ANALYSIS_JSON: &str = r#"{"evaluation": 0.2, "positionType": "equal",
        "suggestedMoves": [{"move": "Nf3", "explanation": "Develops"}],
        "keyPoints": ["Central tension"], "detailedAnalysis": "Even."}"#;

    fn session(ai_color: AiColor, backend: ScriptedBackend) -> Arc<GameSession> {
        let backends: Vec<Arc<dyn ProviderBackend>> = vec![Arc::new(backend)];
        let gateway = Arc::new(ProviderGateway::with_backends(backends));
        let settings = Settings {
            ai_color,
            ..Settings::default()
        };
        GameSession::new(settings, gateway).unwrap()
    }

    fn spec(uci: &str) -> MoveSpec {
        MoveSpec::from_uci(uci).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_e4_answered_by_ai() {
        let backend = ScriptedBackend::new(ProviderId::Gpt4)
            .move_reply("```json\n{\"move\": \"e5\", \"explanation\": \"Mirror\"}\n```")
            .analyses_otherwise(Ok(ANALYSIS_JSON.into()));
        let game = session(AiColor::Black, backend);

        let update = game.human_move(spec("e2e4")).await.unwrap();
        assert!(update.snapshot.is_thinking);
        update.ai_turn.unwrap().await.unwrap();

        let snap = game.snapshot().await;
        assert_eq!(snap.line.sans(), vec!["e4", "e5"]);
        assert!(!snap.is_thinking);
        assert_eq!(snap.turn(), Side::White);
        let analysis = snap.analysis.unwrap();
        assert!(!analysis.unavailable);
        assert_eq!(analysis.suggested_moves[0].san, "Nf3");
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_populate_error() {
        let backend = ScriptedBackend::new(ProviderId::Gpt4)
            .moves_otherwise(Err(AnalysisError::ProviderUnavailable("down".into())));
        let game = session(AiColor::Black, backend);
        let started = tokio::time::Instant::now();

        let update = game.human_move(spec("d2d4")).await.unwrap();
        update.ai_turn.unwrap().await.unwrap();

        let snap = game.snapshot().await;
        assert!(!snap.is_thinking);
        assert_eq!(snap.line.len(), 1);
        let error = snap.error.unwrap();
        assert_eq!(error.code, "provider_unavailable");
        assert!(error.retryable);
        assert_eq!(started.elapsed(), Duration::from_secs(3));

        let after = game.fallback_move().await.unwrap();
        assert_eq!(after.line.len(), 2);
        assert!(after.error.is_none());
        assert!(after.analysis.is_none());
        assert_eq!(after.turn(), Side::White);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_failure() {
        let backend = ScriptedBackend::new(ProviderId::Gpt4)
            .move_failure(AnalysisError::InvalidRequest("bad".into()))
            .move_reply(r#"{"move":"d5"}"#)
            .analyses_otherwise(Ok(ANALYSIS_JSON.into()));
        let game = session(AiColor::Black, backend);

        let update = game.human_move(spec("d2d4")).await.unwrap();
        update.ai_turn.unwrap().await.unwrap();
        assert!(game.snapshot().await.error.is_some());
        assert!(matches!(
            game.human_move(spec("e2e4")).await,
            Err(SessionError::NotHumanTurn)
        ));

        let retry = game.request_ai_move().await.unwrap();
        retry.ai_turn.unwrap().await.unwrap();
        assert_eq!(game.snapshot().await.line.sans(), vec!["d4", "d5"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_discards_in_flight_turn() {
        let backend = ScriptedBackend::new(ProviderId::Gpt4)
            .move_reply_after(Duration::from_secs(10), r#"{"move":"e5"}"#)
            .analyses_otherwise(Ok(ANALYSIS_JSON.into()));
        let game = session(AiColor::Black, backend);

        let update = game.human_move(spec("e2e4")).await.unwrap();
        assert!(matches!(game.undo().await, Err(SessionError::AiThinking)));

        let reset = game.reset().await.unwrap();
        assert!(reset.ai_turn.is_none());
        update.ai_turn.unwrap().await.unwrap();

        let snap = game.snapshot().await;
        assert!(snap.line.is_empty());
        assert!(!snap.is_thinking);
        assert!(snap.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ai_opens_when_playing_white() {
        let backend = ScriptedBackend::new(ProviderId::Gpt4)
            .move_reply("I like 1. e4 best")
            .analyses_otherwise(Err(AnalysisError::RateLimited("quota".into())));
        let game = session(AiColor::White, backend);

        let update = game.resume().await;
        assert!(update.snapshot.is_thinking);
        update.ai_turn.unwrap().await.unwrap();

        let snap = game.snapshot().await;
        assert_eq!(snap.line.sans(), vec!["e4"]);
        assert!(snap.analysis.as_ref().unwrap().unavailable);
        assert_eq!(snap.human_side(), Side::Black);
    }

    #[tokio::test(start_paused = true)]
    async fn test_undo_restores_human_turn() {
        let backend = ScriptedBackend::new(ProviderId::Gpt4)
            .move_reply(r#"{"move":"e5"}"#)
            .analyses_otherwise(Ok(ANALYSIS_JSON.into()));
        let game = session(AiColor::Black, backend);

        let update = game.human_move(spec("e2e4")).await.unwrap();
        update.ai_turn.unwrap().await.unwrap();
        game.add_annotation(1, AnnotationSymbol::Interesting, "symmetric".into())
            .await
            .unwrap();

        let undone = game.undo().await.unwrap();
        assert!(undone.ai_turn.is_none());
        assert!(undone.snapshot.line.is_empty());
        assert!(undone.snapshot.annotations.is_empty());
        assert!(matches!(game.undo().await, Err(SessionError::NothingToUndo)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_runs_out() {
        let game = session(AiColor::Black, ScriptedBackend::new(ProviderId::Gpt4));
        game.update_settings(SettingsPatch {
            time_control: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();

        for _ in 0..60 {
            game.tick().await.unwrap();
        }
        let snap = game.snapshot().await;
        assert_eq!(snap.time_white, 0);
        assert_eq!(snap.game_over.unwrap().winner, Some(Side::Black));
        assert!(matches!(game.tick().await, Err(SessionError::GameOver)));
        assert_eq!(game.snapshot().await.time_black, 60);
    }
}
