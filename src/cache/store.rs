//! Cache Store Module
//!
//! Main cache engine: namespaced HashMap storage with TTL expiration enforced
//! lazily on read and eagerly by [`CacheStore::clear_expired`].

use std::collections::{HashMap, HashSet};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cache::{
    current_timestamp_ms, namespaced_key, validate_key, validate_namespace, validate_ttl,
    CacheEntry, CacheStats, CacheStatsSnapshot, DEFAULT_NAMESPACE,
};
use crate::error::{Result, SdkError};

// == Get Options ==
/// Per-read options for [`CacheStore::get`].
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    /// Namespace to read from, `"default"` when unset
    pub namespace: Option<String>,
    /// Extend the entry's expiry to the default TTL on a hit
    pub refresh_ttl: bool,
}

impl GetOptions {
    /// Reads from the given namespace.
    pub fn in_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..Self::default()
        }
    }

    /// Enables read refresh.
    pub fn refresh_ttl(mut self) -> Self {
        self.refresh_ttl = true;
        self
    }

    fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE)
    }
}

// == Cache Store ==
/// In-memory key/value store with per-entry TTL and namespace partitions.
#[derive(Debug)]
pub struct CacheStore {
    /// Entries keyed by `namespace:key`
    entries: HashMap<String, CacheEntry>,
    /// Usage counters
    stats: CacheStats,
    /// Default TTL in seconds for entries without explicit TTL
    default_ttl: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore with the given default TTL in seconds.
    pub fn new(default_ttl: u64) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            default_ttl,
        }
    }

    /// Default TTL in seconds.
    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    // == Set ==
    /// Stores a value under `namespace:key`, overwriting any existing entry.
    ///
    /// # Arguments
    /// * `key` - Raw key, validated with [`validate_key`]
    /// * `value` - Any serializable value
    /// * `ttl` - TTL in seconds (uses the default TTL if None)
    /// * `namespace` - Namespace (uses `"default"` if None)
    pub fn set<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
        ttl: Option<u64>,
        namespace: Option<&str>,
    ) -> Result<bool> {
        let namespace = namespace.unwrap_or(DEFAULT_NAMESPACE);
        validate_namespace(namespace)?;
        validate_key(key)?;
        validate_ttl(ttl)?;

        let ttl = ttl.unwrap_or(self.default_ttl);

        let value = serde_json::to_value(value).map_err(|e| {
            SdkError::validation(format!("Value for key '{}' is not storable: {}", key, e))
        })?;

        let entry = CacheEntry::new(namespace, key, value, ttl);
        self.entries.insert(namespaced_key(namespace, key), entry);
        self.stats.record_set();

        debug!(namespace, key, ttl, "cache set");
        Ok(true)
    }

    // == Get ==
    /// Retrieves a live value, or `None` on a miss.
    ///
    /// Expired entries are removed on sight and counted as misses, even if
    /// the sweep has not run yet. A namespace containing `:` can never hold
    /// entries and always misses.
    pub fn get(&mut self, key: &str, options: &GetOptions) -> Option<Value> {
        if validate_namespace(options.namespace()).is_err() {
            self.stats.record_miss();
            return None;
        }
        let full_key = namespaced_key(options.namespace(), key);
        let now = current_timestamp_ms();

        let expired = match self.entries.get(&full_key) {
            Some(entry) => entry.is_expired_at(now),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.entries.remove(&full_key);
            self.stats.record_miss();
            debug!(key = %full_key, "cache entry expired on read");
            return None;
        }

        let default_ttl = self.default_ttl;
        let entry = self.entries.get_mut(&full_key)?;
        if options.refresh_ttl {
            entry.refresh(default_ttl);
        }
        self.stats.record_hit();
        Some(entry.value.clone())
    }

    /// Like [`CacheStore::get`] but deserializes the value into `T`.
    pub fn get_as<T: DeserializeOwned>(
        &mut self,
        key: &str,
        options: &GetOptions,
    ) -> Result<Option<T>> {
        match self.get(key, options) {
            Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
                SdkError::validation(format!("Cached value for '{}' has wrong shape: {}", key, e))
            }),
            None => Ok(None),
        }
    }

    // == Get Or Insert ==
    /// Returns the cached value or computes, stores and returns it.
    ///
    /// The whole call runs under `&mut self`, so it cannot race with another
    /// access to the same store.
    pub fn get_or_insert_with<F>(
        &mut self,
        key: &str,
        options: &GetOptions,
        ttl: Option<u64>,
        fallback: F,
    ) -> Result<Value>
    where
        F: FnOnce() -> Result<Value>,
    {
        if let Some(value) = self.get(key, options) {
            return Ok(value);
        }

        let value = fallback()?;
        self.set(key, &value, ttl, Some(options.namespace()))?;
        Ok(value)
    }

    // == Delete ==
    /// Removes an entry. Returns true if something was removed.
    pub fn delete(&mut self, key: &str, namespace: Option<&str>) -> bool {
        let namespace = namespace.unwrap_or(DEFAULT_NAMESPACE);
        if validate_namespace(namespace).is_err() {
            return false;
        }
        let full_key = namespaced_key(namespace, key);
        if self.entries.remove(&full_key).is_some() {
            self.stats.record_deletes(1);
            true
        } else {
            false
        }
    }

    // == Clear Namespace ==
    /// Removes every entry whose key starts with `namespace:`.
    ///
    /// Returns the number of entries removed.
    pub fn clear_namespace(&mut self, namespace: &str) -> Result<usize> {
        validate_namespace(namespace)?;
        let prefix = format!("{}:", namespace);
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(&prefix));

        let removed = before - self.entries.len();
        self.stats.record_deletes(removed as u64);
        debug!(namespace, removed, "cache namespace cleared");
        Ok(removed)
    }

    // == Clear Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn clear_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        before - self.entries.len()
    }

    /// Drops every entry. Counters are left untouched.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    // == Stats ==
    /// Returns counters plus current size and namespace count.
    pub fn stats(&self) -> CacheStatsSnapshot {
        let namespaces: HashSet<&str> = self
            .entries
            .values()
            .map(|entry| entry.namespace.as_str())
            .collect();

        CacheStatsSnapshot::new(&self.stats, self.entries.len(), namespaces.len())
    }

    /// Zeroes the usage counters.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    // == Length ==
    /// Returns the current number of entries, expired-but-unswept included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
