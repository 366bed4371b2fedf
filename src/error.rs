//! Error types for the SDK
//!
//! Every failure that reaches a caller is an [`SdkError`] with a stable
//! [`ErrorKind`]. Raw transport failures are modelled separately as
//! [`TransportError`] and are classified before they leave the governor.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

// == Error Kind ==
/// Machine-readable category of an SDK failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed cache key or invalid configuration value
    Validation,
    /// The rate limiter denied the request
    RateLimitExceeded,
    /// A destructive operation was invoked without confirmation
    ConfirmationRequired,
    /// Transport-level timeout or connection abort
    Network,
    /// The remote service rejected our credentials
    Auth,
    /// Any other remote failure
    Remote,
}

impl ErrorKind {
    /// Stable code for logs and serialized errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::RateLimitExceeded => "rate_limit_exceeded",
            ErrorKind::ConfirmationRequired => "confirmation_required",
            ErrorKind::Network => "network",
            ErrorKind::Auth => "auth",
            ErrorKind::Remote => "remote",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// == SDK Error ==
/// Error surfaced to SDK callers.
#[derive(Error, Debug, Clone, Serialize)]
#[error("{kind}: {message}")]
pub struct SdkError {
    /// Stable category
    pub kind: ErrorKind,
    /// Human-readable description
    pub message: String,
    /// When the error was raised
    pub timestamp: DateTime<Utc>,
    /// Milliseconds to wait before retrying, for rate limit rejections
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
    /// Remote HTTP status, when one was received
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Whether the governor may retry the failed call
    #[serde(skip)]
    transient: bool,
}

impl SdkError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            timestamp: Utc::now(),
            retry_after_ms: None,
            status: None,
            transient: false,
        }
    }

    /// Invalid key, option or configuration value.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Limiter rejection. `retry_after_ms` is `None` when the caller should
    /// simply wait for the current window to roll over.
    pub fn rate_limited(retry_after_ms: Option<u64>) -> Self {
        let message = match retry_after_ms {
            Some(ms) => format!("Rate limit exceeded, retry after {} ms", ms),
            None => "Rate limit exceeded for the current window".to_string(),
        };
        Self {
            retry_after_ms,
            ..Self::new(ErrorKind::RateLimitExceeded, message)
        }
    }

    /// Destructive call without its confirmation flag.
    pub fn confirmation_required(operation: &str) -> Self {
        Self::new(
            ErrorKind::ConfirmationRequired,
            format!("{} requires explicit confirmation (force_delete)", operation),
        )
    }

    /// Transient transport failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            transient: true,
            ..Self::new(ErrorKind::Network, message)
        }
    }

    /// Authorization rejected by the remote service.
    pub fn auth(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            ..Self::new(ErrorKind::Auth, message)
        }
    }

    /// Generic remote failure.
    pub fn remote(status: Option<u16>, message: impl Into<String>, transient: bool) -> Self {
        Self {
            status,
            transient,
            ..Self::new(ErrorKind::Remote, message)
        }
    }

    // == Classification ==
    /// Translates a raw transport failure into the SDK taxonomy.
    pub fn from_transport(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(msg) => Self::network(format!("Request timed out: {}", msg)),
            TransportError::ConnectionAborted(msg) => {
                Self::network(format!("Connection aborted: {}", msg))
            }
            TransportError::Status { status, message } => match status {
                401 | 403 => Self::auth(status, message),
                408 | 429 | 500..=599 => Self::remote(Some(status), message, true),
                _ => Self::remote(Some(status), message, false),
            },
            TransportError::Decode(msg) => {
                Self::remote(None, format!("Invalid response body: {}", msg), false)
            }
            TransportError::Other(msg) => Self::remote(None, msg, false),
        }
    }

    /// Returns true when retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        self.transient
    }
}

// == Transport Error ==
/// Raw failure reported by a [`crate::transport::Transport`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request did not complete in time
    #[error("timeout: {0}")]
    Timeout(String),

    /// The connection was refused, reset or dropped
    #[error("connection aborted: {0}")]
    ConnectionAborted(String),

    /// The remote answered with a non-success status
    #[error("status {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// Anything else
    #[error("{0}")]
    Other(String),
}

// == Result Type Alias ==
/// Convenience Result type for the SDK.
pub type Result<T> = std::result::Result<T, SdkError>;
