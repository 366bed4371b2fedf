//! Rate Limiter Statistics

use serde::Serialize;

/// Decision counters. Every check bumps `total_requests` and exactly one of
/// the other two.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RateLimiterStats {
    pub total_requests: u64,
    pub blocked_requests: u64,
    pub successful_requests: u64,
}

impl RateLimiterStats {
    pub fn record_allowed(&mut self) {
        self.total_requests += 1;
        self.successful_requests += 1;
    }

    pub fn record_blocked(&mut self) {
        self.total_requests += 1;
        self.blocked_requests += 1;
    }
}
