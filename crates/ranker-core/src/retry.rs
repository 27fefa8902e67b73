//! Retry policy for upstream market-data calls
//!
//! The policy owns the attempt budget and the pause between attempts; the
//! operation itself only reports success or a [`StockError`]. Errors that are
//! not [`StockError::is_retryable`] end the loop immediately.

use crate::error::{Result, StockError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,

    /// Pause before the first retry
    pub initial_backoff: Duration,

    /// Upper bound on any single pause
    pub max_backoff: Duration,

    /// Growth factor between pauses (1.0 keeps them fixed)
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    /// Three attempts, two seconds apart
    fn default() -> Self {
        Self::fixed(3, Duration::from_secs(2))
    }
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(
        max_attempts: u32,
        initial_backoff: Duration,
        max_backoff: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            max_backoff,
            backoff_multiplier,
        }
    }

    /// Same pause between every attempt
    pub fn fixed(max_attempts: u32, backoff: Duration) -> Self {
        Self::new(max_attempts, backoff, backoff, 1.0)
    }

    /// Create a policy with no retries
    pub fn no_retry() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    /// Full attempt budget without pauses (for tests)
    pub fn immediate(max_attempts: u32) -> Self {
        Self::fixed(max_attempts, Duration::ZERO)
    }

    /// Pause before attempt number `attempt` (0-based; attempt 0 never waits)
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let backoff_ms =
            self.initial_backoff.as_millis() as f64 * self.backoff_multiplier.powi(exponent);

        Duration::from_millis(backoff_ms as u64).min(self.max_backoff)
    }

    /// Execute an async operation with retry logic
    ///
    /// Returns the first success, the first non-retryable error, or the last
    /// error once the budget is spent.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            debug!("Attempt {}/{} for {}", attempt + 1, attempts, operation_name);

            let error = match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!("{} succeeded after {} retries", operation_name, attempt);
                    }
                    return Ok(result);
                }
                Err(e) => e,
            };

            if !error.is_retryable() {
                debug!("{} failed with non-retryable error: {}", operation_name, error);
                return Err(error);
            }

            attempt += 1;
            if attempt >= attempts {
                warn!(
                    "{} failed after {} attempts: {}",
                    operation_name, attempts, error
                );
                return Err(error);
            }

            let backoff = self.backoff_duration(attempt);
            warn!(
                "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                operation_name, attempt, attempts, error, backoff
            );
            if !backoff.is_zero() {
                sleep(backoff).await;
            }
        }
    }
}
