//! One retry/backoff policy shared by page scrapes and detail fetches.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::app::{HarvestError, Result};
use crate::scraper::RetrySettings;

/// Retries a fallible operation with capped, growing delays.
///
/// Attempt `k` (zero-based) that fails with a recoverable error is followed by
/// a sleep of `base_delay * factor^k` plus up to `jitter`, then attempt `k + 1`,
/// as long as `k < max_retries`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub factor: u32,
    pub jitter: Duration,
}

impl RetryPolicy {
    pub fn exponential(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            factor: 2,
            jitter: Duration::ZERO,
        }
    }

    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay: delay,
            factor: 1,
            jitter: Duration::ZERO,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Deterministic part of the delay after failed attempt `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let multiplier = self.factor.max(1).saturating_pow(attempt);
        self.base_delay.saturating_mul(multiplier)
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(fastrand::u64(0..=jitter_ms))
        };
        self.delay_for(attempt).saturating_add(jitter)
    }

    pub async fn run<T, F, Fut>(&self, operation: &str, op: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.run_observed(operation, op, |_, _, _| {}).await
    }

    /// Like [`run`](Self::run), calling `on_retry(next_attempt, error, delay)`
    /// before each backoff sleep.
    pub async fn run_observed<T, F, Fut, R>(
        &self,
        operation: &str,
        mut op: F,
        mut on_retry: R,
    ) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
        R: FnMut(u32, &HarvestError, Duration),
    {
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_recoverable() && attempt < self.max_retries => {
                    let delay = self.backoff(attempt);
                    warn!(
                        "{} failed on attempt {}/{}: {}. Retrying in {:?}",
                        operation,
                        attempt + 1,
                        self.attempts(),
                        e,
                        delay
                    );
                    on_retry(attempt + 1, &e, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.is_recoverable() => {
                    return Err(HarvestError::RetriesExhausted {
                        operation: operation.to_string(),
                        attempts: attempt + 1,
                        last: Box::new(e),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            base_delay: settings.base_delay(),
            factor: settings.factor,
            jitter: Duration::from_millis(settings.jitter_ms),
        }
    }
}
