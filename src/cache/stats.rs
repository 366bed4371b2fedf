//! Cache Statistics Module
//!
//! Tracks cache usage counters: hits, misses, sets and deletes.

use serde::Serialize;

// == Cache Stats ==
/// Monotonic usage counters, reset only through [`CacheStats::reset`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of reads that returned a live entry
    pub hits: u64,
    /// Number of reads that found nothing or an expired entry
    pub misses: u64,
    /// Number of successful writes
    pub sets: u64,
    /// Number of entries removed explicitly
    pub deletes: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    pub fn record_deletes(&mut self, count: u64) {
        self.deletes += count;
    }

    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// == Stats Snapshot ==
/// Point-in-time view of the cache returned by `CacheStore::stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    /// Entries currently held, expired-but-unswept included
    pub size: usize,
    /// Distinct namespaces among held entries
    pub namespace_count: usize,
    pub hit_rate: f64,
}

impl CacheStatsSnapshot {
    pub fn new(stats: &CacheStats, size: usize, namespace_count: usize) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            sets: stats.sets,
            deletes: stats.deletes,
            size,
            namespace_count,
            hit_rate: stats.hit_rate(),
        }
    }
}
