//! Rate Limiter Configuration

use serde::Serialize;

use crate::error::{Result, SdkError};

/// Immutable limiter settings, derived once from [`crate::Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimiterConfig {
    /// Requests admitted per window
    pub max_requests_per_minute: u32,
    /// Window length in milliseconds
    pub window_size_ms: u64,
    /// How long a burst block lasts, in milliseconds
    pub block_duration_ms: u64,
    /// Request count within a window that triggers a block
    pub burst_limit: u32,
}

impl RateLimiterConfig {
    /// Burst threshold used when none is configured: 1.5x the window budget,
    /// rounded up.
    pub fn default_burst(max_requests_per_minute: u32) -> u32 {
        ((max_requests_per_minute as u64 * 3 + 1) / 2) as u32
    }

    /// Config with the given budget and default window, block and burst.
    pub fn with_max(max_requests_per_minute: u32) -> Self {
        Self {
            max_requests_per_minute,
            burst_limit: Self::default_burst(max_requests_per_minute),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_requests_per_minute == 0 {
            return Err(SdkError::validation("max_requests_per_minute must be positive"));
        }
        if self.burst_limit < self.max_requests_per_minute {
            return Err(SdkError::validation(format!(
                "burst_limit ({}) must be at least max_requests_per_minute ({})",
                self.burst_limit, self.max_requests_per_minute
            )));
        }
        if self.window_size_ms == 0 || self.block_duration_ms == 0 {
            return Err(SdkError::validation(
                "window_size_ms and block_duration_ms must be positive",
            ));
        }
        Ok(())
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_requests_per_minute: 60,
            window_size_ms: 60_000,
            block_duration_ms: 300_000,
            burst_limit: 90,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RateLimiterConfig::default();
        assert_eq!(config.max_requests_per_minute, 60);
        assert_eq!(config.window_size_ms, 60_000);
        assert_eq!(config.block_duration_ms, 300_000);
        assert_eq!(config.burst_limit, 90);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_burst_rounds_up() {
        assert_eq!(RateLimiterConfig::default_burst(60), 90);
        assert_eq!(RateLimiterConfig::default_burst(10), 15);
        assert_eq!(RateLimiterConfig::default_burst(1), 2);
        assert_eq!(RateLimiterConfig::default_burst(5), 8);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(RateLimiterConfig::with_max(0).validate().is_err());

        let config = RateLimiterConfig {
            burst_limit: 5,
            ..RateLimiterConfig::with_max(10)
        };
        assert!(config.validate().is_err());

        let config = RateLimiterConfig {
            window_size_ms: 0,
            ..RateLimiterConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
