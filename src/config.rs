//! Configuration Module
//!
//! Loads SDK configuration from environment variables once at startup.
//! The resulting [`Config`] is never mutated afterwards.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::{Result, SdkError};
use crate::rate_limiter::RateLimiterConfig;

/// Default base URL of the remote sleep-data API.
pub const DEFAULT_BASE_URL: &str = "https://api.sleep.example.com/v1";

// == Environment ==
/// Deployment environment the SDK runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
    Test,
}

impl FromStr for Environment {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(SdkError::validation(format!(
                "Unknown environment '{}'. Valid: development, staging, production, test",
                other
            ))),
        }
    }
}

// == Cache Config ==
/// Cache-related settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL in seconds for entries stored without an explicit TTL
    pub default_ttl: u64,
    /// Warm the cache with the default record page on init
    pub preload: bool,
    /// Interval in seconds for the optional expiry sweep
    pub cleanup_interval: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: 3600,
            preload: false,
            cleanup_interval: 60,
        }
    }
}

// == Config ==
/// SDK configuration parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key sent as a bearer token
    pub api_key: String,
    pub environment: Environment,
    /// Base URL of the remote API
    pub base_url: String,
    /// Requests allowed per rate-limit window
    pub max_requests_per_minute: u32,
    /// Request count at which the limiter blocks outright
    pub burst_limit: u32,
    pub cache: CacheConfig,
    /// Upper bound on a single remote call
    pub request_timeout: Duration,
    /// Retries for transient remote failures
    pub max_retries: u32,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SLEEP_API_KEY` - API key (required)
    /// - `SLEEP_API_ENV` - development | staging | production | test (default: development)
    /// - `SLEEP_API_BASE_URL` - Remote base URL
    /// - `SLEEP_MAX_REQUESTS_PER_MINUTE` - Window budget (default: 60)
    /// - `SLEEP_BURST_LIMIT` - Burst threshold (default: 1.5x the window budget)
    /// - `SLEEP_CACHE_TTL` - Default cache TTL in seconds (default: 3600)
    /// - `SLEEP_CACHE_PRELOAD` - Warm the cache on init (default: false)
    /// - `SLEEP_CLEANUP_INTERVAL` - Expiry sweep interval in seconds (default: 60)
    /// - `SLEEP_REQUEST_TIMEOUT_MS` - Remote call timeout (default: 10000)
    /// - `SLEEP_MAX_RETRIES` - Retries for transient failures (default: 3)
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("SLEEP_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| SdkError::validation("SLEEP_API_KEY is required"))?;

        let environment = match env::var("SLEEP_API_ENV") {
            Ok(v) => v.parse()?,
            Err(_) => Environment::default(),
        };

        let max_requests_per_minute = parse_var("SLEEP_MAX_REQUESTS_PER_MINUTE").unwrap_or(60);
        let burst_limit = parse_var("SLEEP_BURST_LIMIT")
            .unwrap_or_else(|| RateLimiterConfig::default_burst(max_requests_per_minute));

        let config = Self {
            api_key,
            environment,
            base_url: env::var("SLEEP_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into()),
            max_requests_per_minute,
            burst_limit,
            cache: CacheConfig {
                default_ttl: parse_var("SLEEP_CACHE_TTL").unwrap_or(3600),
                preload: parse_var("SLEEP_CACHE_PRELOAD").unwrap_or(false),
                cleanup_interval: parse_var("SLEEP_CLEANUP_INTERVAL").unwrap_or(60),
            },
            request_timeout: Duration::from_millis(
                parse_var("SLEEP_REQUEST_TIMEOUT_MS").unwrap_or(10_000),
            ),
            max_retries: parse_var("SLEEP_MAX_RETRIES").unwrap_or(3),
        };

        config.validate()?;
        Ok(config)
    }

    /// Builds a configuration for the test environment with default limits.
    pub fn for_test(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            environment: Environment::Test,
            base_url: DEFAULT_BASE_URL.into(),
            max_requests_per_minute: 60,
            burst_limit: RateLimiterConfig::default_burst(60),
            cache: CacheConfig::default(),
            request_timeout: Duration::from_secs(10),
            max_retries: 3,
        }
    }

    // == Validate ==
    /// Rejects configurations the limiter or cache cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(SdkError::validation("API key cannot be empty"));
        }
        if self.cache.default_ttl == 0 {
            return Err(SdkError::validation("Default cache TTL must be positive"));
        }
        if self.request_timeout.is_zero() {
            return Err(SdkError::validation("Request timeout must be positive"));
        }
        self.rate_limiter_config().validate()
    }

    /// Derives the immutable limiter configuration.
    pub fn rate_limiter_config(&self) -> RateLimiterConfig {
        RateLimiterConfig {
            max_requests_per_minute: self.max_requests_per_minute,
            burst_limit: self.burst_limit,
            ..RateLimiterConfig::default()
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_config_for_test() {
        let config = Config::for_test("key");
        assert_eq!(config.environment, Environment::Test);
        assert_eq!(config.max_requests_per_minute, 60);
        assert_eq!(config.burst_limit, 90);
        assert_eq!(config.cache.default_ttl, 3600);
        assert!(!config.cache.preload);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!("production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("STAGING".parse::<Environment>().unwrap(), Environment::Staging);
        assert_eq!("test".parse::<Environment>().unwrap(), Environment::Test);

        let err = "qa".parse::<Environment>().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_validate_rejects_burst_below_max() {
        let mut config = Config::for_test("key");
        config.burst_limit = 10;
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_validate_rejects_empty_key() {
        let config = Config::for_test("  ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_env() {
        // Single test touches the process environment to avoid races between tests
        env::remove_var("SLEEP_API_KEY");
        let err = Config::from_env().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        env::set_var("SLEEP_API_KEY", "secret");
        env::set_var("SLEEP_MAX_REQUESTS_PER_MINUTE", "10");
        env::remove_var("SLEEP_BURST_LIMIT");
        env::remove_var("SLEEP_API_ENV");
        env::set_var("SLEEP_CACHE_TTL", "not-a-number");

        let config = Config::from_env().unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.max_requests_per_minute, 10);
        assert_eq!(config.burst_limit, 15);
        assert_eq!(config.cache.default_ttl, 3600);

        env::remove_var("SLEEP_API_KEY");
        env::remove_var("SLEEP_MAX_REQUESTS_PER_MINUTE");
        env::remove_var("SLEEP_CACHE_TTL");
    }
}
