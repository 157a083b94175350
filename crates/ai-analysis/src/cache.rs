//! FEN-keyed analysis cache with a time-to-live.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::analysis::Analysis;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

struct CacheEntry {
    analysis: Analysis,
    stored_at: Instant,
}

/// Timestamps use `tokio::time::Instant` so paused-clock tests can expire entries.
pub struct AnalysisCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl AnalysisCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// A fresh entry for exactly this FEN. Expired entries are evicted.
    pub fn get(&self, fen: &str) -> Option<Analysis> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(fen) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.analysis.clone()),
            Some(_) => {
                entries.remove(fen);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, fen: &str, analysis: Analysis) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                fen.to_string(),
                CacheEntry {
                    analysis,
                    stored_at: Instant::now(),
                },
            );
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
