//! In-memory registry of live games. Nothing outlives the process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

use ai_analysis::ProviderGateway;
use game_session::{GameSession, Settings};

use crate::clock;
use crate::error::AppError;

/// How often idle games are looked for.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct Entry {
    session: Arc<GameSession>,
    last_seen: Mutex<Instant>,
}

impl Entry {
    fn idle_for(&self, now: Instant) -> Duration {
        self.last_seen
            .lock()
            .map(|seen| now.saturating_duration_since(*seen))
            .unwrap_or_default()
    }
}

pub struct GameRegistry {
    gateway: Arc<ProviderGateway>,
    /// Games untouched for this long are dropped by the sweeper.
    idle_ttl: Duration,
    games: RwLock<HashMap<Uuid, Entry>>,
}

impl GameRegistry {
    pub fn new(gateway: Arc<ProviderGateway>, idle_ttl: Duration) -> Self {
        Self {
            gateway,
            idle_ttl,
            games: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new game and start its clock.
    pub fn create(&self, settings: Settings) -> Result<Arc<GameSession>, AppError> {
        let session = GameSession::new(settings, Arc::clone(&self.gateway))?;
        let entry = Entry {
            session: Arc::clone(&session),
            last_seen: Mutex::new(Instant::now()),
        };
        self.games
            .write()
            .map_err(|_| AppError::Internal("game registry lock poisoned".into()))?
            .insert(session.id(), entry);
        clock::spawn_clock(&session);
        Ok(session)
    }

    /// Look up a game and mark it as recently used.
    pub fn get(&self, id: Uuid) -> Result<Arc<GameSession>, AppError> {
        let games = self
            .games
            .read()
            .map_err(|_| AppError::Internal("game registry lock poisoned".into()))?;
        let entry = games
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Game {id} not found")))?;
        if let Ok(mut seen) = entry.last_seen.lock() {
            *seen = Instant::now();
        }
        Ok(Arc::clone(&entry.session))
    }

    /// Drop a game. Its clock stops on the next tick.
    pub fn remove(&self, id: Uuid) -> Result<(), AppError> {
        let removed = self
            .games
            .write()
            .map_err(|_| AppError::Internal("game registry lock poisoned".into()))?
            .remove(&id);
        match removed {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("Game {id} not found"))),
        }
    }

    /// Drop every game idle for at least the configured time. Returns how many went.
    pub fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let Ok(mut games) = self.games.write() else {
            return 0;
        };
        let before = games.len();
        games.retain(|id, entry| {
            let keep = entry.idle_for(now) < self.idle_ttl;
            if !keep {
                tracing::info!(game_id = %id, "Evicting idle game");
            }
            keep
        });
        before - games.len()
    }

    pub fn len(&self) -> usize {
        self.games.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sweep `registry` for idle games every `period` until the registry is dropped.
pub fn spawn_sweeper(registry: &Arc<GameRegistry>, period: Duration) -> JoinHandle<()> {
    let weak: Weak<GameRegistry> = Arc::downgrade(registry);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let Some(registry) = weak.upgrade() else {
                break;
            };
            let evicted = registry.evict_idle();
            if evicted > 0 {
                tracing::debug!(evicted, remaining = registry.len(), "Idle sweep finished");
            }
        }
    })
}
