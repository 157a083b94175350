//! Per-game one-second clock ticker.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use game_session::{GameSession, SessionError};

pub const TICK: Duration = Duration::from_secs(1);

/// Tick `session` once a second until it is dropped. Ticks the reducer
/// refuses (thinking, game over) are skipped.
pub fn spawn_clock(session: &Arc<GameSession>) -> JoinHandle<()> {
    let weak: Weak<GameSession> = Arc::downgrade(session);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + TICK, TICK);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let Some(session) = weak.upgrade() else {
                break;
            };
            match session.tick().await {
                Ok(_) | Err(SessionError::AiThinking) | Err(SessionError::GameOver) => {}
                Err(e) => tracing::debug!(game_id = %session.id(), error = %e, "Clock tick skipped"),
            }
        }
    })
}
