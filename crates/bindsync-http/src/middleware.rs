//! Retry and pacing middleware

use std::time::Duration;

use tracing::{debug, warn};

use crate::{error::HttpError, Result};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, first try included
    pub max_attempts: u32,
    /// Delay unit; the n-th failed attempt waits `base_delay * n`
    pub base_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(800),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Backoff after the given (1-based) failed attempt
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.saturating_mul(attempt);
        std::cmp::min(delay, self.max_delay)
    }
}

/// Retry middleware for HTTP operations
pub struct RetryMiddleware {
    config: RetryConfig,
}

impl RetryMiddleware {
    /// Create new retry middleware
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute operation with retry logic
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!("Request succeeded on attempt {attempt}");
                    }
                    return Ok(result);
                }
                Err(e) if !e.is_retryable() => {
                    debug!("Non-retryable error: {e}");
                    return Err(e);
                }
                Err(e) if attempt >= max_attempts => {
                    if max_attempts == 1 {
                        return Err(e);
                    }
                    return Err(HttpError::RetryLimitExceeded {
                        attempts: attempt,
                        source: Box::new(e),
                    });
                }
                Err(e) => {
                    let delay = self.config.calculate_delay(attempt);
                    warn!(
                        "Request failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt, max_attempts, delay, e
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Fixed inter-request delay
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    delay: Duration,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Sleep for the pacing delay (no-op when zero)
    pub async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}
