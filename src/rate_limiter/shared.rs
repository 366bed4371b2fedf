//! Shared Rate Limiter Handle
//!
//! Wraps the limiter in `Arc<Mutex<_>>` so every check is one uninterrupted
//! read-modify-write, whichever task issues it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Result, SdkError};
use crate::rate_limiter::{LimiterState, RateDecision, RateLimiter, RateLimiterConfig, RateLimiterStats};

/// Cloneable handle to the process-wide limiter.
#[derive(Debug, Clone)]
pub struct SharedRateLimiter {
    inner: Arc<Mutex<RateLimiter>>,
}

impl SharedRateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RateLimiter::new(config))),
        }
    }

    // == Check ==
    /// Admits or rejects one request.
    pub async fn check_rate_limit(&self, identifier: Option<&str>) -> RateDecision {
        self.inner.lock().await.check(identifier)
    }

    // == Acquire ==
    /// Waits for admission, re-checking at most `max_waits` times.
    ///
    /// Sleeps for the block's `retry_after` or, when only the window is
    /// spent, until the window resets. Gives up with `RateLimitExceeded`
    /// once the waits are used up.
    pub async fn acquire(&self, identifier: Option<&str>, max_waits: u32) -> Result<RateDecision> {
        let mut attempt = 0;
        loop {
            let decision = self.check_rate_limit(identifier).await;
            if decision.allowed {
                return Ok(decision);
            }
            if attempt >= max_waits {
                return Err(SdkError::rate_limited(decision.retry_after_ms));
            }

            let wait_ms = decision.retry_after_ms.unwrap_or(decision.reset_ms) + 1;
            debug!(attempt, wait_ms, "rate limited, waiting for admission");
            tokio::time::sleep(Duration::from_millis(wait_ms)).await;
            attempt += 1;
        }
    }

    // == Reset ==
    /// Administrative reset back to Open; optionally zeroes the counters.
    pub async fn reset_rate_limiter(&self, clear_stats: bool) {
        self.inner.lock().await.reset(clear_stats);
    }

    pub async fn stats(&self) -> RateLimiterStats {
        self.inner.lock().await.stats()
    }

    pub async fn state(&self) -> LimiterState {
        self.inner.lock().await.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn config(max: u32, window_ms: u64) -> RateLimiterConfig {
        RateLimiterConfig {
            max_requests_per_minute: max,
            window_size_ms: window_ms,
            block_duration_ms: 60_000,
            burst_limit: max * 10,
        }
    }

    #[tokio::test]
    async fn test_concurrent_checks_admit_exactly_max() {
        let limiter = SharedRateLimiter::new(config(10, 60_000));

        let mut handles = vec![];
        for _ in 0..25 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.check_rate_limit(None).await.allowed
            }));
        }

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            }
        }

        assert_eq!(allowed, 10);
        let stats = limiter.stats().await;
        assert_eq!(stats.total_requests, 25);
        assert_eq!(stats.successful_requests, 10);
        assert_eq!(stats.blocked_requests, 15);
    }

    #[tokio::test]
    async fn test_acquire_waits_for_window() {
        let limiter = SharedRateLimiter::new(config(1, 50));

        assert!(limiter.check_rate_limit(None).await.allowed);
        let decision = limiter.acquire(Some("test"), 3).await.unwrap();
        assert!(decision.allowed);
    }

    #[tokio::test]
    async fn test_acquire_gives_up() {
        let limiter = SharedRateLimiter::new(config(1, 60_000));

        assert!(limiter.check_rate_limit(None).await.allowed);
        let err = limiter.acquire(None, 0).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::RateLimitExceeded);
    }

    #[tokio::test]
    async fn test_reset_rate_limiter() {
        let limiter = SharedRateLimiter::new(config(1, 60_000));

        limiter.check_rate_limit(None).await;
        limiter.check_rate_limit(None).await;
        assert_eq!(limiter.state().await, LimiterState::WindowLimited);

        limiter.reset_rate_limiter(false).await;
        assert_eq!(limiter.state().await, LimiterState::Open);
        assert_eq!(limiter.stats().await.total_requests, 2);

        limiter.reset_rate_limiter(true).await;
        assert_eq!(limiter.stats().await, RateLimiterStats::default());
    }
}
