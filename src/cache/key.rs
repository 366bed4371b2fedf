//! Cache Key Module
//!
//! Key validation and namespacing.

use crate::cache::MAX_KEY_LENGTH;
use crate::error::{Result, SdkError};

// == Validate Key ==
/// Checks that a key is non-empty, at most [`MAX_KEY_LENGTH`] characters and
/// made only of `[A-Za-z0-9_.:-]`.
///
/// Callers building keys from external input must run them through this
/// before handing them to the store.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(SdkError::validation("Cache key cannot be empty"));
    }

    if key.chars().count() > MAX_KEY_LENGTH {
        return Err(SdkError::validation(format!(
            "Cache key exceeds maximum length of {} characters",
            MAX_KEY_LENGTH
        )));
    }

    if let Some(bad) = key.chars().find(|c| !is_key_char(*c)) {
        return Err(SdkError::validation(format!(
            "Cache key contains invalid character {:?}",
            bad
        )));
    }

    Ok(())
}

// == Validate Namespace ==
/// Key rules plus no `:`, so `namespace:key` always splits back uniquely.
pub fn validate_namespace(namespace: &str) -> Result<()> {
    validate_key(namespace)?;
    if namespace.contains(':') {
        return Err(SdkError::validation(format!(
            "Cache namespace '{}' cannot contain ':'",
            namespace
        )));
    }
    Ok(())
}

// == Validate TTL ==
/// Rejects a zero TTL. `None` means the store default.
pub fn validate_ttl(ttl: Option<u64>) -> Result<()> {
    if ttl == Some(0) {
        return Err(SdkError::validation("Cache TTL must be positive"));
    }
    Ok(())
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':' | '-')
}

// == Namespaced Key ==
/// Builds the externally visible key `namespace:raw_key`.
pub fn namespaced_key(namespace: &str, raw_key: &str) -> String {
    format!("{}:{}", namespace, raw_key)
}
