//! Health probing for monitored services.
#![allow(clippy::cognitive_complexity)]

/// `key=value` health body parsing
pub mod health_body;
/// Probe executor with retries, jitter and outage confirmation
pub mod probe;

pub use probe::{ComponentProbe, ProbeExecutor, ProbeOutcome};
