//! Retry Policy
//!
//! Exponential backoff around an async producer.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{FetchError, Result};

/// Default number of retries after the first failed attempt
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Default backoff base delay
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

// == Retry Policy ==
/// How many times to retry and how long to wait in between.
///
/// The delay before retry `n` (0-indexed) is `base_delay * 2^n`, so the
/// defaults wait 1s, 2s, then 4s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first failure
    pub attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts,
            base_delay,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.retry_attempts, config.retry_delay)
    }

    /// Backoff before retry `retry` (0-indexed). Saturates instead of overflowing.
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }

    /// Producer invocations made when every attempt fails.
    pub fn max_invocations(&self) -> u32 {
        self.attempts.saturating_add(1)
    }

    // == Run ==
    /// Calls `producer` until it succeeds or the retry budget is spent.
    ///
    /// Returns `FetchError::RetryExhausted` carrying the last error once
    /// `attempts + 1` invocations have failed.
    pub async fn run<V, F, Fut>(&self, mut producer: F) -> Result<V>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        let mut retry = 0;
        loop {
            match producer().await {
                Ok(value) => {
                    if retry > 0 {
                        debug!(retries = retry, "Fetch succeeded after retrying");
                    }
                    return Ok(value);
                }
                Err(err) if retry >= self.attempts => {
                    warn!(attempts = retry + 1, error = %err, "Fetch failed, retries exhausted");
                    return Err(FetchError::exhausted(retry + 1, err));
                }
                Err(err) => {
                    let delay = self.delay_for(retry);
                    warn!(
                        attempt = retry + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Fetch attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
            }
        }
    }
}
