//! Timeout, retry and cancellation around one provider call.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::AnalysisError;

pub const MAX_RETRIES: u32 = 2;
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);
const BASE_DELAY: Duration = Duration::from_secs(1);

/// Delay before retry `retry` (0-based): 1s, 2s, 4s, ...
pub fn backoff_delay(retry: u32) -> Duration {
    BASE_DELAY * 2u32.saturating_pow(retry)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            attempt_timeout: ATTEMPT_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    /// Run `attempt` until it succeeds, fails terminally, or the retry budget
    /// is spent.
    ///
    /// A timed-out attempt is terminal. Cancellation wins over everything,
    /// including a pending backoff sleep.
    pub async fn run<T, F, Fut>(
        &self,
        token: &CancellationToken,
        label: &str,
        mut attempt: F,
    ) -> Result<T, AnalysisError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, AnalysisError>>,
    {
        let mut retry = 0;
        loop {
            let outcome = tokio::select! {
                _ = token.cancelled() => return Err(AnalysisError::Cancelled),
                outcome = tokio::time::timeout(self.attempt_timeout, attempt(retry + 1)) => outcome,
            };

            let err = match outcome {
                Ok(Ok(value)) => return Ok(value),
                Err(_) => {
                    warn!(request = label, attempt = retry + 1, "Request timed out");
                    return Err(AnalysisError::AnalysisTimeout(self.attempt_timeout.as_secs()));
                }
                Ok(Err(e)) => e,
            };

            if !err.retryable() || retry >= self.max_retries {
                debug!(request = label, attempt = retry + 1, error = %err, "Giving up");
                return Err(err);
            }

            let delay = backoff_delay(retry);
            warn!(
                request = label,
                attempt = retry + 1,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Attempt failed, backing off"
            );
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = token.cancelled() => return Err(AnalysisError::Cancelled),
            }
            retry += 1;
        }
    }
}
