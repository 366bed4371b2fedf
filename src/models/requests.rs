//! Caller-supplied options for governed operations.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Fields to change on a record.
pub type UpdateFields = Map<String, Value>;

/// Options for `fetch_one`.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchOptions {
    /// Read from the cache before calling out
    #[serde(default = "default_true")]
    pub use_cache: bool,
    /// TTL in seconds for the cached result
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            ttl: None,
        }
    }
}

/// Options for `fetch_many`.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchManyOptions {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Maximum number of records
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default = "default_true")]
    pub use_cache: bool,
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl Default for FetchManyOptions {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            limit: None,
            use_cache: true,
            ttl: None,
        }
    }
}

impl FetchManyOptions {
    /// Returns an error message if the date range is inverted or the limit is zero.
    pub fn validate(&self) -> Option<String> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Some(format!("start_date {} is after end_date {}", start, end));
            }
        }
        if self.limit == Some(0) {
            return Some("limit must be positive".to_string());
        }
        None
    }

    /// Deterministic cache key for this query.
    pub fn cache_key(&self) -> String {
        let date = |d: Option<NaiveDate>| {
            d.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "any".to_string())
        };
        let limit = self
            .limit
            .map(|l| l.to_string())
            .unwrap_or_else(|| "all".to_string());
        format!(
            "records.{}.{}.{}",
            date(self.start_date),
            date(self.end_date),
            limit
        )
    }
}

/// Options for `delete`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DeleteOptions {
    /// Must be true for the delete to proceed
    #[serde(default)]
    pub force_delete: bool,
}

impl DeleteOptions {
    pub fn confirmed() -> Self {
        Self { force_delete: true }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_many_cache_key() {
        let opts = FetchManyOptions::default();
        assert_eq!(opts.cache_key(), "records.any.any.all");

        let opts = FetchManyOptions {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31),
            limit: Some(10),
            ..FetchManyOptions::default()
        };
        assert_eq!(opts.cache_key(), "records.2024-01-01.2024-01-31.10");
        assert!(crate::cache::validate_key(&opts.cache_key()).is_ok());
    }

    #[test]
    fn test_fetch_many_validate() {
        let opts = FetchManyOptions {
            start_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..FetchManyOptions::default()
        };
        assert!(opts.validate().is_some());

        let opts = FetchManyOptions {
            limit: Some(0),
            ..FetchManyOptions::default()
        };
        assert!(opts.validate().is_some());
        assert!(FetchManyOptions::default().validate().is_none());
    }

    #[test]
    fn test_options_deserialize_defaults() {
        let opts: FetchOptions = serde_json::from_str("{}").unwrap();
        assert!(opts.use_cache);
        assert!(opts.ttl.is_none());

        let opts: FetchManyOptions =
            serde_json::from_str(r#"{"start_date": "2024-03-01", "limit": 7}"#).unwrap();
        assert_eq!(opts.start_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(opts.limit, Some(7));

        let opts: DeleteOptions = serde_json::from_str("{}").unwrap();
        assert!(!opts.force_delete);
    }
}
