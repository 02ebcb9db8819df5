//! Pacing between fetches
//!
//! FBref blocks clients that request pages back to back, so every fetch is
//! followed by a pause drawn uniformly from a configured range.

use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::info;

use crate::config::{secs, PacingConfig};

/// Sleeps a random interval after each fetch
#[derive(Debug, Clone)]
pub struct Pacer {
    min_delay: Duration,
    max_delay: Duration,
}

impl Pacer {
    /// Create a pacer sleeping between `min_secs` and `max_secs`
    ///
    /// Bounds given in the wrong order are swapped; negative bounds count as
    /// zero and bounds too large for a `Duration` saturate.
    ///
    /// # Example
    /// ```
    /// use fbref_core::Pacer;
    /// use std::time::Duration;
    ///
    /// let pacer = Pacer::new(5.0, 10.0);
    /// assert_eq!(pacer.min_delay(), Duration::from_secs(5));
    /// ```
    pub fn new(min_secs: f64, max_secs: f64) -> Self {
        let a = secs(min_secs);
        let b = secs(max_secs);
        Self {
            min_delay: a.min(b),
            max_delay: a.max(b),
        }
    }

    /// Create a pacer with a fixed delay
    pub fn fixed(secs: f64) -> Self {
        Self::new(secs, secs)
    }

    /// Create a pacer that never sleeps
    pub fn none() -> Self {
        Self::fixed(0.0)
    }

    /// Create a pacer from configuration
    pub fn from_config(config: &PacingConfig) -> Self {
        Self::new(config.min_secs, config.max_secs)
    }

    /// Draw the next delay
    pub fn next_delay(&self) -> Duration {
        if self.max_delay == self.min_delay {
            return self.min_delay;
        }
        let drawn = rand::thread_rng()
            .gen_range(self.min_delay.as_secs_f64()..=self.max_delay.as_secs_f64());
        secs(drawn)
    }

    /// Sleep for the next delay
    pub async fn pause(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }
        info!("Waiting {:.1}s before the next request", delay.as_secs_f64());
        sleep(delay).await;
    }

    /// Lower bound of the delay
    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Upper bound of the delay
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::from_config(&PacingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_pacer_bounds() {
        let pacer = Pacer::new(5.0, 10.0);
        assert_eq!(pacer.min_delay(), Duration::from_secs(5));
        assert_eq!(pacer.max_delay(), Duration::from_secs(10));
    }

    #[test]
    fn test_pacer_swaps_reversed_bounds() {
        let pacer = Pacer::new(3.0, 1.0);
        assert_eq!(pacer.min_delay(), Duration::from_secs(1));
        assert_eq!(pacer.max_delay(), Duration::from_secs(3));
    }

    #[test]
    fn test_next_delay_within_range() {
        let pacer = Pacer::new(0.5, 1.5);
        for _ in 0..100 {
            let delay = pacer.next_delay();
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1500));
        }
    }

    #[test]
    fn test_unbounded_values_do_not_panic() {
        let pacer = Pacer::new(f64::INFINITY, 1e30);
        assert_eq!(pacer.min_delay(), Duration::MAX);
        assert_eq!(pacer.next_delay(), Duration::MAX);

        let pacer = Pacer::new(0.0, f64::INFINITY);
        assert_eq!(pacer.max_delay(), Duration::MAX);
        let _ = pacer.next_delay();
    }

    #[test]
    fn test_fixed_delay() {
        let pacer = Pacer::fixed(8.0);
        assert_eq!(pacer.next_delay(), Duration::from_secs(8));
    }

    #[test]
    fn test_default_matches_config() {
        let pacer = Pacer::default();
        assert_eq!(pacer.min_delay(), Duration::from_secs(5));
        assert_eq!(pacer.max_delay(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_pause_sleeps() {
        let pacer = Pacer::fixed(0.05);
        let start = Instant::now();
        pacer.pause().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_none_returns_immediately() {
        let start = Instant::now();
        Pacer::none().pause().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
