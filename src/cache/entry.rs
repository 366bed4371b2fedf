//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

// == Cache Entry ==
/// A single cached value, owned by the store.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Raw key as supplied by the caller
    pub key: String,
    /// Namespace the entry belongs to
    pub namespace: String,
    /// The stored value
    pub value: Value,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl_seconds` from now.
    pub fn new(namespace: &str, key: &str, value: Value, ttl_seconds: u64) -> Self {
        Self {
            key: key.to_string(),
            namespace: namespace.to_string(),
            value,
            expires_at: expiry_from_now(ttl_seconds),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches `expires_at`, so a
    /// fully elapsed TTL never yields a stale read.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    pub(crate) fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    /// Pushes the expiry out to `ttl_seconds` from now.
    pub fn refresh(&mut self, ttl_seconds: u64) {
        self.expires_at = expiry_from_now(ttl_seconds);
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Absolute expiry for a TTL starting now. Saturates at `u64::MAX`, so a
/// huge TTL means "never expires" instead of wrapping into the past.
fn expiry_from_now(ttl_seconds: u64) -> u64 {
    current_timestamp_ms().saturating_add(ttl_seconds.saturating_mul(1000))
}
