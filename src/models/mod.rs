//! Request options and response types for governed operations.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{DeleteOptions, FetchManyOptions, FetchOptions, UpdateFields};
pub use responses::{GovernedCallResult, StatsReport};
