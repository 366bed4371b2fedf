//! Cache Module
//!
//! Namespaced in-memory cache with per-entry TTL and usage counters.

mod entry;
mod key;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use key::{namespaced_key, validate_key, validate_namespace, validate_ttl};
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use store::{CacheStore, GetOptions};

// == Public Constants ==
/// Maximum allowed key length in characters
pub const MAX_KEY_LENGTH: usize = 256;

/// Namespace used when the caller does not name one
pub const DEFAULT_NAMESPACE: &str = "default";
