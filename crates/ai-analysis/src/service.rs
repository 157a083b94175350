//! Cached, retried, cancellable analysis and move requests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::seq::IndexedRandom;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use chess_core::{PlayedMove, Position};

use crate::analysis::Analysis;
use crate::cache::{AnalysisCache, DEFAULT_TTL};
use crate::difficulty::DifficultyProfile;
use crate::error::AnalysisError;
use crate::gateway::ProviderGateway;
use crate::parser::{self, MoveSuggestion};
use crate::provider::{ProviderId, RequestConfig, RequestKind};
use crate::retry::RetryPolicy;

pub const FALLBACK_EXPLANATION: &str =
    "Fallback move: picked at random from the legal moves after the AI gave no usable move. Not AI-reasoned.";

/// A move for the AI side, with whatever analysis could be attached.
#[derive(Debug, Clone, PartialEq)]
pub struct AiMove {
    pub played: PlayedMove,
    pub explanation: String,
    pub analysis: Option<Analysis>,
    /// Why `analysis` is missing, if it is.
    pub analysis_error: Option<AnalysisError>,
    /// Chosen locally at random rather than suggested by a provider.
    pub fallback: bool,
}

/// One provider round trip for an analysis, without retries.
pub async fn fetch_analysis(
    gateway: &ProviderGateway,
    position: &Position,
    provider: ProviderId,
    config: &RequestConfig,
    confidence: f64,
) -> Result<Analysis, AnalysisError> {
    let raw = gateway
        .request(provider, RequestKind::Analyze, position.fen(), config)
        .await?;
    let parsed = parser::parse_analysis(position, &raw)?;
    Ok(Analysis::assemble(provider, position, parsed, confidence))
}

/// One provider round trip for a move suggestion, without retries.
pub async fn fetch_move(
    gateway: &ProviderGateway,
    position: &Position,
    provider: ProviderId,
    config: &RequestConfig,
) -> Result<MoveSuggestion, AnalysisError> {
    let raw = gateway
        .request(provider, RequestKind::SuggestMove, position.fen(), config)
        .await?;
    parser::parse_move(position, &raw)
}

/// A random legal move, clearly labelled as such. `None` when the side to
/// move has no legal moves.
pub fn fallback_move(position: &Position) -> Option<AiMove> {
    let legal = position.legal_moves();
    let played = legal.choose(&mut rand::rng())?.clone();
    Some(AiMove {
        played,
        explanation: FALLBACK_EXPLANATION.to_string(),
        analysis: None,
        analysis_error: None,
        fallback: true,
    })
}

/// Request controller for one game: one in-flight request at a time, a
/// FEN-keyed cache, and the retry policy.
pub struct AnalysisService {
    gateway: Arc<ProviderGateway>,
    cache: AnalysisCache,
    policy: RetryPolicy,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl AnalysisService {
    pub fn new(gateway: Arc<ProviderGateway>) -> Self {
        Self::with_policy(gateway, RetryPolicy::default(), DEFAULT_TTL)
    }

    pub fn with_policy(gateway: Arc<ProviderGateway>, policy: RetryPolicy, ttl: Duration) -> Self {
        Self {
            gateway,
            cache: AnalysisCache::new(ttl),
            policy,
            in_flight: Mutex::new(None),
        }
    }

    /// Supersede whatever request is running and hand out a token for the new one.
    fn begin_request(&self) -> CancellationToken {
        let token = CancellationToken::new();
        if let Ok(mut slot) = self.in_flight.lock() {
            if let Some(previous) = slot.replace(token.clone()) {
                previous.cancel();
            }
        }
        token
    }

    /// Cancel the in-flight request, if any.
    pub fn cancel(&self) {
        if let Ok(mut slot) = self.in_flight.lock() {
            if let Some(token) = slot.take() {
                token.cancel();
            }
        }
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    fn profile(difficulty: u8) -> Result<&'static DifficultyProfile, AnalysisError> {
        DifficultyProfile::for_level(difficulty)
            .ok_or_else(|| AnalysisError::InvalidRequest(format!("difficulty {difficulty} out of range")))
    }

    /// Analysis for `position`, served from the cache when fresh.
    pub async fn analyze(
        &self,
        position: &Position,
        provider: ProviderId,
        difficulty: u8,
    ) -> Result<Analysis, AnalysisError> {
        if let Some(hit) = self.cache.get(position.fen()) {
            debug!(fen = %position.fen(), "Analysis cache hit");
            return Ok(hit);
        }

        let profile = Self::profile(difficulty)?;
        let config = profile.request_config();
        let token = self.begin_request();

        let gateway = self.gateway.as_ref();
        let config_ref = &config;
        let analysis = self
            .policy
            .run(&token, "analyze", move |_| {
                fetch_analysis(gateway, position, provider, config_ref, profile.confidence)
            })
            .await?;

        self.cache.insert(position.fen(), analysis.clone());
        Ok(analysis)
    }

    /// A legal move for the side to move, plus best-effort analysis of the
    /// position it was played from. Analysis failure never fails the move.
    pub async fn suggest_move(
        &self,
        position: &Position,
        provider: ProviderId,
        difficulty: u8,
    ) -> Result<AiMove, AnalysisError> {
        let profile = Self::profile(difficulty)?;
        let config = profile.request_config();
        let token = self.begin_request();

        let gateway = self.gateway.as_ref();
        let config_ref = &config;
        let suggestion = self
            .policy
            .run(&token, "move", move |_| fetch_move(gateway, position, provider, config_ref))
            .await?;
        info!(provider = %provider, san = %suggestion.played.san, "AI move obtained");

        if token.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }

        let (analysis, analysis_error) = match self.analyze(position, provider, difficulty).await {
            Ok(analysis) => (Some(analysis), None),
            Err(e) => {
                warn!(provider = %provider, error = %e, "Analysis unavailable for AI move");
                (None, Some(e))
            }
        };

        Ok(AiMove {
            played: suggestion.played,
            explanation: suggestion.explanation,
            analysis,
            analysis_error,
            fallback: false,
        })
    }
}
