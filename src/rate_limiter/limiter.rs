//! Rate Limiter State Machine
//!
//! All timestamps are milliseconds since the limiter's own monotonic origin.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, warn};

use crate::rate_limiter::{RateLimiterConfig, RateLimiterStats};

// == Limiter State ==
/// Externally observable limiter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimiterState {
    Open,
    WindowLimited,
    Blocked,
}

// == Rate Decision ==
/// Outcome of a single limiter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateDecision {
    pub allowed: bool,
    /// Requests still available in the current window
    pub remaining: u32,
    /// Milliseconds until the current window ends
    pub reset_ms: u64,
    /// Milliseconds until a block lifts. `None` unless blocked.
    pub retry_after_ms: Option<u64>,
}

// == Rate Limiter ==
/// Fixed-window limiter with burst blocking.
///
/// Every check counts toward the window, admitted or not, so a client that
/// keeps hammering a spent window eventually crosses the burst threshold.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    origin: Instant,
    request_count: u32,
    window_start: u64,
    blocked_until: Option<u64>,
    stats: RateLimiterStats,
}

impl RateLimiter {
    // == Constructor ==
    /// Creates an Open limiter whose first window starts now.
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            origin: Instant::now(),
            request_count: 0,
            window_start: 0,
            blocked_until: None,
            stats: RateLimiterStats::default(),
        }
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Milliseconds elapsed since the limiter was created.
    pub fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    // == Check ==
    /// Admits or rejects one request at the current time.
    pub fn check(&mut self, identifier: Option<&str>) -> RateDecision {
        let now = self.now_ms();
        let decision = self.check_at(now);
        debug!(
            identifier = identifier.unwrap_or("anonymous"),
            allowed = decision.allowed,
            remaining = decision.remaining,
            "rate limit check"
        );
        decision
    }

    /// Admits or rejects one request at `now_ms`.
    pub fn check_at(&mut self, now_ms: u64) -> RateDecision {
        self.roll_window(now_ms);

        let elapsed = now_ms.saturating_sub(self.window_start);
        let reset_ms = self.config.window_size_ms.saturating_sub(elapsed);

        if let Some(until) = self.blocked_until {
            if now_ms < until {
                self.stats.record_blocked();
                return RateDecision {
                    allowed: false,
                    remaining: 0,
                    reset_ms,
                    retry_after_ms: Some(until - now_ms),
                };
            }
            self.blocked_until = None;
        }

        if self.request_count >= self.config.burst_limit {
            let until = now_ms.saturating_add(self.config.block_duration_ms);
            self.blocked_until = Some(until);
            self.stats.record_blocked();
            warn!(
                count = self.request_count,
                burst_limit = self.config.burst_limit,
                block_ms = self.config.block_duration_ms,
                "burst limit reached, blocking requests"
            );
            return RateDecision {
                allowed: false,
                remaining: 0,
                reset_ms,
                retry_after_ms: Some(self.config.block_duration_ms),
            };
        }

        self.request_count += 1;

        if self.request_count > self.config.max_requests_per_minute {
            self.stats.record_blocked();
            return RateDecision {
                allowed: false,
                remaining: 0,
                reset_ms,
                retry_after_ms: None,
            };
        }

        self.stats.record_allowed();
        RateDecision {
            allowed: true,
            remaining: self.config.max_requests_per_minute - self.request_count,
            reset_ms,
            retry_after_ms: None,
        }
    }

    /// Starts a new window once the current one has fully elapsed. An active
    /// block survives the roll and lifts only when its own timer expires.
    fn roll_window(&mut self, now_ms: u64) {
        if now_ms.saturating_sub(self.window_start) > self.config.window_size_ms {
            self.request_count = 0;
            self.window_start = now_ms;
            if self.blocked_until.is_some_and(|until| now_ms >= until) {
                self.blocked_until = None;
            }
        }
    }

    // == Reset ==
    /// Forces the limiter back to Open with a fresh window.
    pub fn reset(&mut self, clear_stats: bool) {
        let now = self.now_ms();
        self.reset_at(now, clear_stats);
    }

    pub fn reset_at(&mut self, now_ms: u64, clear_stats: bool) {
        self.request_count = 0;
        self.window_start = now_ms;
        self.blocked_until = None;
        if clear_stats {
            self.stats = RateLimiterStats::default();
        }
    }

    // == Introspection ==
    pub fn stats(&self) -> RateLimiterStats {
        self.stats
    }

    pub fn request_count(&self) -> u32 {
        self.request_count
    }

    pub fn blocked_until(&self) -> Option<u64> {
        self.blocked_until
    }

    /// State as of now.
    pub fn state(&self) -> LimiterState {
        self.state_at(self.now_ms())
    }

    /// State a check at `now_ms` would start from.
    pub fn state_at(&self, now_ms: u64) -> LimiterState {
        if self.blocked_until.is_some_and(|until| now_ms < until) {
            return LimiterState::Blocked;
        }
        let window_over = now_ms.saturating_sub(self.window_start) > self.config.window_size_ms;
        if !window_over && self.request_count >= self.config.max_requests_per_minute {
            LimiterState::WindowLimited
        } else {
            LimiterState::Open
        }
    }
}
