//! Shared helpers for incident payloads and matching.
use std::collections::BTreeMap;

use primitives::StatusValue;

use crate::payload::{Incident, IncidentState, IncidentUpdate, NewIncident};

/// Body sent when an incident is resolved.
pub const RESOLVED_BODY: &str = "The issue has been resolved.";

/// Conventional incident name for `component_id`.
pub fn incident_name(component_id: &str) -> String {
    format!("Service Issue - {component_id}")
}

/// Build a standard incident creation payload for a given component.
pub fn build_incident_payload(component_id: &str, message: String) -> NewIncident {
    NewIncident {
        name: incident_name(component_id),
        status: IncidentState::Investigating,
        body: message,
        component_ids: vec![component_id.to_owned()],
        components: BTreeMap::from([(component_id.to_owned(), StatusValue::MajorOutage)]),
        deliver_notifications: true,
    }
}

/// Build an update moving an open incident back to investigating with a fresh message.
pub fn build_investigating_payload(component_id: &str, message: String) -> IncidentUpdate {
    IncidentUpdate {
        status: IncidentState::Investigating,
        body: message,
        components: BTreeMap::from([(component_id.to_owned(), StatusValue::MajorOutage)]),
    }
}

/// Build a standard incident resolve payload for a given component.
pub fn build_resolve_payload(component_id: &str) -> IncidentUpdate {
    IncidentUpdate {
        status: IncidentState::Resolved,
        body: RESOLVED_BODY.to_owned(),
        components: BTreeMap::from([(component_id.to_owned(), StatusValue::Operational)]),
    }
}

/// Unresolved incidents belonging to `component_id`, in the order the API returned them.
pub fn matching_incidents<'a>(incidents: &'a [Incident], component_id: &str) -> Vec<&'a Incident> {
    incidents.iter().filter(|i| i.affects(component_id)).collect()
}
