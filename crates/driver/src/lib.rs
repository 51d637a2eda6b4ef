//! statuswatch driver: probes every service and reconciles the status page.

pub mod driver;
pub mod report;

pub use driver::Driver;
pub use report::{RunOutcome, RunReport, ServiceReport};
