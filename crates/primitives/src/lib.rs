//! Core primitives shared by the statuswatch crates.
/// Retry, timeout and jitter helpers
pub mod retries;
/// Component status values
pub mod status;

pub use status::StatusValue;
