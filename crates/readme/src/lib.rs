//! README project line updater backed by WakaTime activity.

/// Project line rendering and README rewriting
pub mod block;
/// WakaTime API client
pub mod client;
/// Selection of the most recently active projects
pub mod projects;

pub use block::{build_projects_line, replace_projects_block, update_readme};
pub use client::{ApiError, WakaTimeClient};
pub use projects::{ProjectRecord, select_recent_projects};
