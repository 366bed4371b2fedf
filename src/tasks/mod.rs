//! Background Tasks Module
//!
//! Optional periodic maintenance. Expiry is already enforced on read, so
//! nothing here is required for correctness.

mod cleanup;

pub use cleanup::{spawn_cleanup_task, sweep_expired, SweepReport};
