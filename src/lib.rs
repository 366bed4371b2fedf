//! Sleep SDK - client for a remote sleep-data API
//!
//! Every outbound call goes through a request governor that consults a
//! namespaced TTL cache, then a fixed-window rate limiter with burst
//! blocking, and only then the remote service.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod governor;
pub mod models;
pub mod rate_limiter;
pub mod tasks;
pub mod transport;

pub use client::SleepClient;
pub use config::Config;
pub use error::{ErrorKind, Result, SdkError};
pub use governor::{GovernedRequest, Governor, GovernorContext, RetryPolicy};
pub use tasks::spawn_cleanup_task;
