//! Incident crate: Statuspage integration and reconciliation.
#![allow(clippy::cognitive_complexity)]
/// Statuspage client
pub mod client;
/// Shared helpers for payload building and incident matching
pub mod helpers;
/// Request and response bodies of the Statuspage API
pub mod payload;
/// Reconciliation of probed statuses with the status page
pub mod reconciler;

pub use client::{ApiError, Client};
pub use reconciler::{FailedStep, IncidentAction, ReconcileOutcome, SkipReason, StatusReconciler};
