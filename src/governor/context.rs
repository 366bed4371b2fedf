//! Governor Context
//!
//! Owns the shared cache and limiter. Created explicitly with
//! [`GovernorContext::new`] and reset with [`GovernorContext::reset`], so each
//! client or test gets its own isolated state.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use crate::cache::{CacheStatsSnapshot, CacheStore, GetOptions};
use crate::config::Config;
use crate::error::Result;
use crate::rate_limiter::{RateLimiterConfig, SharedRateLimiter};

/// Shared state every governed call goes through.
#[derive(Debug, Clone)]
pub struct GovernorContext {
    /// Thread-safe cache store
    pub cache: Arc<RwLock<CacheStore>>,
    /// Process-wide limiter
    pub limiter: SharedRateLimiter,
}

impl GovernorContext {
    /// Initializes fresh state from configuration.
    pub fn new(config: &Config) -> Self {
        Self::from_parts(config.cache.default_ttl, config.rate_limiter_config())
    }

    pub fn from_parts(default_ttl: u64, limiter: RateLimiterConfig) -> Self {
        Self {
            cache: Arc::new(RwLock::new(CacheStore::new(default_ttl))),
            limiter: SharedRateLimiter::new(limiter),
        }
    }

    // == Reset ==
    /// Drops every cache entry and returns the limiter to Open.
    /// With `clear_stats`, cache and limiter counters are zeroed too.
    pub async fn reset(&self, clear_stats: bool) {
        let removed = {
            let mut cache = self.cache.write().await;
            if clear_stats {
                cache.reset_stats();
            }
            cache.clear()
        };
        self.limiter.reset_rate_limiter(clear_stats).await;
        info!(removed, clear_stats, "governor state reset");
    }

    // == Cache Fallback ==
    /// Returns the cached value or computes it with `fallback` and stores it.
    ///
    /// The lock is released while `fallback` runs. Two tasks missing on the
    /// same key at once may both compute and both write; the later write wins.
    pub async fn cache_get_or_insert_with<F, Fut>(
        &self,
        key: &str,
        options: &GetOptions,
        ttl: Option<u64>,
        fallback: F,
    ) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        if let Some(value) = self.cache.write().await.get(key, options) {
            return Ok(value);
        }

        let value = fallback().await?;
        self.cache
            .write()
            .await
            .set(key, &value, ttl, options.namespace.as_deref())?;
        Ok(value)
    }

    pub async fn cache_stats(&self) -> CacheStatsSnapshot {
        self.cache.read().await.stats()
    }
}
