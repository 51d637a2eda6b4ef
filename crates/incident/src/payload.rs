use std::collections::BTreeMap;

use primitives::StatusValue;
use serde::{Deserialize, Serialize};

/// Incident‐level state sent to Statuspage.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IncidentState {
    /// Incident is being investigated.
    Investigating,
    /// Incident is resolved.
    Resolved,
}

/// Payload for creating a new incident.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct NewIncident {
    /// Incident name
    pub name: String,
    /// Incident status (e.g. investigating)
    pub status: IncidentState,
    /// Incident message/description
    pub body: String,
    /// Affected component IDs
    pub component_ids: Vec<String>,
    /// Component statuses applied with the incident
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub components: BTreeMap<String, StatusValue>,
    /// Whether to notify subscribers
    pub deliver_notifications: bool,
}

/// Payload for updating or resolving an existing incident.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct IncidentUpdate {
    /// New incident status
    pub status: IncidentState,
    /// Update message
    pub body: String,
    /// Component statuses applied with the update
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub components: BTreeMap<String, StatusValue>,
}

/// `{"incident": ...}` request envelope.
#[derive(Debug, Serialize)]
pub(crate) struct IncidentEnvelope<'a, T> {
    pub(crate) incident: &'a T,
}

/// `{"component": {"status": ...}}` request body.
#[derive(Debug, Serialize)]
pub(crate) struct ComponentEnvelope {
    pub(crate) component: ComponentPatch,
}

#[derive(Debug, Serialize)]
pub(crate) struct ComponentPatch {
    pub(crate) status: StatusValue,
}

/// Component reference inside an incident.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct IncidentComponent {
    /// Component ID
    pub id: String,
}

/// An incident as reported by `GET /incidents/unresolved`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Incident {
    /// Incident ID
    pub id: String,
    /// Incident name
    #[serde(default)]
    pub name: String,
    /// Associated components
    #[serde(default)]
    pub components: Vec<IncidentComponent>,
}

impl Incident {
    /// Whether the incident belongs to `component_id`, by naming convention or association.
    pub fn affects(&self, component_id: &str) -> bool {
        self.name == crate::helpers::incident_name(component_id)
            || self.components.iter().any(|c| c.id == component_id)
    }
}
