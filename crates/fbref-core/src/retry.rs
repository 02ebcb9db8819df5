//! Retry logic with exponential backoff.
//!
//! Both transports retry only errors that [`FbrefError::is_transient`]
//! accepts; everything else is returned on the first failure.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{FbrefError, Result};

/// Retry budget and backoff growth
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles with every further retry
    pub backoff_factor: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_factor: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Create a policy
    pub fn new(max_retries: u32, backoff_factor: Duration) -> Self {
        Self {
            max_retries,
            backoff_factor,
        }
    }

    /// Policy that never retries
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before the retry following attempt `attempt` (0-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff_factor.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Run `operation` until it succeeds, fails permanently, or the budget runs out.
pub async fn with_backoff<T, F, Fut>(policy: &RetryPolicy, operation_name: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        let error: FbrefError = match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!("{} succeeded after {} retries", operation_name, attempt);
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if !error.is_transient() || attempt >= policy.max_retries {
            return Err(error);
        }

        let delay = policy.delay_for_attempt(attempt);
        warn!(
            "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
            operation_name,
            attempt + 1,
            policy.max_retries + 1,
            error,
            delay
        );
        sleep(delay).await;
        attempt += 1;
    }
}
