use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One project as listed by WakaTime.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ProjectRecord {
    /// Project name
    pub name: String,
    /// Time of the last heartbeat sent for the project
    #[serde(default)]
    pub last_heartbeat_at: Option<DateTime<Utc>>,
}

/// Up to `limit` distinct project names, most recently active first.
///
/// Records without a heartbeat sort last and keep their relative order. Names are
/// trimmed; empty names are dropped and repeated names keep their first occurrence.
pub fn select_recent_projects(records: &[ProjectRecord], limit: usize) -> Vec<String> {
    let mut ordered: Vec<&ProjectRecord> = records.iter().collect();
    // stable sort, `None` after every timestamp
    ordered.sort_by(|a, b| b.last_heartbeat_at.cmp(&a.last_heartbeat_at));

    let mut seen = HashSet::new();
    ordered
        .into_iter()
        .map(|r| r.name.trim())
        .filter(|name| !name.is_empty() && seen.insert(*name))
        .take(limit)
        .map(str::to_owned)
        .collect()
}
