//! Rate Limiter Module
//!
//! Fixed-window request counter with a burst threshold that triggers a
//! temporary block.
//!
//! # States
//! - Open: requests are admitted
//! - WindowLimited: the window budget is spent, wait for the window to roll
//! - Blocked: the burst threshold was crossed, wait out the block timer

mod config;
mod limiter;
mod shared;
mod stats;

pub use config::RateLimiterConfig;
pub use limiter::{LimiterState, RateDecision, RateLimiter};
pub use shared::SharedRateLimiter;
pub use stats::RateLimiterStats;
