//! Values returned to SDK callers.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStatsSnapshot;
use crate::error::{Result, SdkError};
use crate::rate_limiter::{LimiterState, RateLimiterStats};

/// Result of a governed read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GovernedCallResult {
    pub data: Value,
    /// True when served from the cache without a remote call
    pub from_cache: bool,
}

impl GovernedCallResult {
    /// Deserializes `data` into a caller type.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.data)
            .map_err(|e| SdkError::remote(None, format!("Unexpected response shape: {}", e), false))
    }
}

/// Combined cache and limiter statistics.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub cache: CacheStatsSnapshot,
    pub rate_limiter: RateLimiterStats,
    pub limiter_state: LimiterState,
    /// When the report was taken, ISO 8601
    pub generated_at: DateTime<Utc>,
}

impl StatsReport {
    pub fn new(
        cache: CacheStatsSnapshot,
        rate_limiter: RateLimiterStats,
        limiter_state: LimiterState,
    ) -> Self {
        Self {
            cache,
            rate_limiter,
            limiter_state,
            generated_at: Utc::now(),
        }
    }
}
