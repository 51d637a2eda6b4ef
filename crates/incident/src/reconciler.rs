use chrono::Utc;
use primitives::StatusValue;
use tracing::{debug, error, info, warn};

use crate::{
    client::{ApiError, Client as IncidentClient},
    helpers::{
        build_incident_payload, build_investigating_payload, build_resolve_payload,
        matching_incidents,
    },
    payload::Incident,
};

/// Why a reconciliation was skipped without contacting the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A previous request this run returned HTTP 401.
    AuthFailed,
}

/// Step at which a best-effort write sequence gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedStep {
    /// `PATCH /components/{id}`
    UpdateComponent,
    /// `GET /incidents/unresolved`
    ListIncidents,
    /// `POST /incidents` or `PATCH /incidents/{id}`
    WriteIncident,
}

/// Incident write performed after a component status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncidentAction {
    /// A new incident was opened.
    Created(String),
    /// An existing open incident received a new update.
    Updated(String),
    /// These incidents were resolved (possibly none).
    Resolved(Vec<String>),
}

/// Result of reconciling one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Remote status already matched; nothing was written.
    Unchanged,
    /// The component was updated and the incident action applied.
    Updated(IncidentAction),
    /// Nothing was attempted.
    Skipped(SkipReason),
    /// A request failed and the remaining writes were abandoned.
    Failed(FailedStep),
}

/// Aligns Statuspage components and incidents with freshly probed statuses.
///
/// Remote state is the only source of truth: the current component status and
/// the unresolved incidents are fetched again for every component.
#[derive(Debug)]
pub struct StatusReconciler {
    client: IncidentClient,
    reporting_enabled: bool,
    auth_failed: bool,
}

impl StatusReconciler {
    /// Create a reconciler. With `reporting_enabled == false` writes are only logged.
    pub const fn new(client: IncidentClient, reporting_enabled: bool) -> Self {
        Self { client, reporting_enabled, auth_failed: false }
    }

    /// Whether a 401 was seen during this run.
    pub const fn auth_failed(&self) -> bool {
        self.auth_failed
    }

    /// Push `probed` for `component_id` if it differs from the remote status,
    /// then open, update or resolve the component's incidents.
    pub async fn reconcile(
        &mut self,
        component_id: &str,
        probed: StatusValue,
        message: &str,
    ) -> ReconcileOutcome {
        if self.auth_failed {
            debug!(component_id, "skipping reconciliation after authentication failure");
            return ReconcileOutcome::Skipped(SkipReason::AuthFailed);
        }

        let remote = match self.client.component_status(component_id).await {
            Ok(raw) => {
                let parsed = StatusValue::parse(&raw);
                if parsed.is_none() {
                    debug!(component_id, remote = %raw, "remote status outside the managed set");
                }
                parsed
            }
            Err(ApiError::Unauthorized) => return self.unauthorized(component_id),
            Err(e) => {
                warn!(error = %e, component_id, "failed to fetch component status, pushing update");
                None
            }
        };

        if remote == Some(probed) {
            debug!(component_id, status = %probed, "component status unchanged");
            return ReconcileOutcome::Unchanged;
        }

        info!(component_id, remote = ?remote, probed = %probed, "component status changed");

        if let Err(e) = self.update_component(component_id, probed).await {
            return self.failed(e, component_id, FailedStep::UpdateComponent);
        }

        let incidents = match self.client.unresolved_incidents().await {
            Ok(incidents) => incidents,
            Err(e) => return self.failed(e, component_id, FailedStep::ListIncidents),
        };
        let matching = matching_incidents(&incidents, component_id);

        let action = match probed {
            StatusValue::Operational => self.resolve_all(component_id, &matching).await,
            StatusValue::MajorOutage => {
                self.open_or_update(component_id, message, matching.first().copied()).await
            }
        };

        match action {
            Ok(action) => ReconcileOutcome::Updated(action),
            Err(e) => self.failed(e, component_id, FailedStep::WriteIncident),
        }
    }

    async fn update_component(&self, component_id: &str, status: StatusValue) -> Result<(), ApiError> {
        if !self.reporting_enabled {
            warn!(component_id, %status, "Statuspage reporting disabled - would update component");
            return Ok(());
        }
        self.client.update_component(component_id, status).await?;
        info!(component_id, %status, "Updated component status");
        Ok(())
    }

    async fn resolve_all(
        &self,
        component_id: &str,
        incidents: &[&Incident],
    ) -> Result<IncidentAction, ApiError> {
        let payload = build_resolve_payload(component_id);
        let mut resolved = Vec::with_capacity(incidents.len());

        for incident in incidents {
            let id = incident.id.as_str();
            if !self.reporting_enabled {
                warn!(incident_id = %id, component_id, "Statuspage reporting disabled - would resolve incident");
                resolved.push(id.to_owned());
                continue;
            }

            debug!(incident_id = %id, "Closing incident");
            match self.client.update_incident(id, &payload).await {
                Ok(()) => {
                    info!(incident_id = %id, component_id, "Successfully resolved incident");
                    resolved.push(id.to_owned());
                }
                Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized),
                Err(e) => error!(incident_id = %id, error = %e, "Failed to resolve incident"),
            }
        }

        Ok(IncidentAction::Resolved(resolved))
    }

    async fn open_or_update(
        &self,
        component_id: &str,
        message: &str,
        existing: Option<&Incident>,
    ) -> Result<IncidentAction, ApiError> {
        if let Some(incident) = existing {
            let id = incident.id.as_str();
            if self.reporting_enabled {
                let payload = build_investigating_payload(component_id, message.to_owned());
                self.client.update_incident(id, &payload).await?;
                info!(incident_id = %id, component_id, "Updated existing incident");
            } else {
                warn!(incident_id = %id, component_id, "Statuspage reporting disabled - would update incident");
            }
            return Ok(IncidentAction::Updated(id.to_owned()));
        }

        let payload = build_incident_payload(component_id, message.to_owned());
        if !self.reporting_enabled {
            let synthetic_id = format!("dryrun:{}", Utc::now().timestamp_millis());
            warn!(
                incident_id = %synthetic_id,
                name = %payload.name,
                body = %payload.body,
                components = ?payload.component_ids,
                "Statuspage reporting disabled - would create incident"
            );
            return Ok(IncidentAction::Created(synthetic_id));
        }

        let id = self.client.create_incident(&payload).await?;
        info!(
            incident_id = %id,
            name = %payload.name,
            body = %payload.body,
            components = ?payload.component_ids,
            "Created incident"
        );
        Ok(IncidentAction::Created(id))
    }

    fn unauthorized(&mut self, component_id: &str) -> ReconcileOutcome {
        self.auth_failed = true;
        error!(component_id, "Statuspage authentication failed - skipping remaining writes");
        ReconcileOutcome::Skipped(SkipReason::AuthFailed)
    }

    fn failed(&mut self, err: ApiError, component_id: &str, step: FailedStep) -> ReconcileOutcome {
        if matches!(err, ApiError::Unauthorized) {
            return self.unauthorized(component_id);
        }
        error!(error = %err, component_id, ?step, "Statuspage request failed");
        ReconcileOutcome::Failed(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Mock, Server, ServerGuard};
    use serde_json::json;

    async fn setup() -> ServerGuard {
        Server::new_async().await
    }

    fn reconciler(server: &ServerGuard, reporting_enabled: bool) -> StatusReconciler {
        let client = IncidentClient::with_base_url(
            "test_api_key".into(),
            "page".into(),
            server.url().parse().unwrap(),
        );
        StatusReconciler::new(client, reporting_enabled)
    }

    async fn remote_status(server: &mut ServerGuard, id: &str, status: &str) -> Mock {
        server
            .mock("GET", format!("/pages/page/components/{id}").as_str())
            .match_header("authorization", "OAuth test_api_key")
            .with_status(200)
            .with_body(json!({"id": id, "status": status}).to_string())
            .create_async()
            .await
    }

    async fn component_patch(server: &mut ServerGuard, id: &str, status: &str, hits: usize) -> Mock {
        server
            .mock("PATCH", format!("/pages/page/components/{id}").as_str())
            .match_body(Matcher::PartialJson(json!({"component": {"status": status}})))
            .with_status(200)
            .with_body("{}")
            .expect(hits)
            .create_async()
            .await
    }

    async fn unresolved(server: &mut ServerGuard, body: serde_json::Value) -> Mock {
        server
            .mock("GET", "/pages/page/incidents/unresolved")
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await
    }

    #[tokio::test]
    async fn unchanged_status_is_idempotent() {
        let mut server = setup().await;
        let get = server
            .mock("GET", "/pages/page/components/c1")
            .with_status(200)
            .with_body(r#"{"id":"c1","status":"operational"}"#)
            .expect(2)
            .create_async()
            .await;
        let patch = component_patch(&mut server, "c1", "operational", 0).await;
        let list = server.mock("GET", "/pages/page/incidents/unresolved").expect(0).create_async().await;

        let mut rec = reconciler(&server, true);
        assert_eq!(rec.reconcile("c1", StatusValue::Operational, "ok").await, ReconcileOutcome::Unchanged);
        assert_eq!(rec.reconcile("c1", StatusValue::Operational, "ok").await, ReconcileOutcome::Unchanged);

        get.assert_async().await;
        patch.assert_async().await;
        list.assert_async().await;
    }

    #[tokio::test]
    async fn outage_without_open_incident_creates_one() {
        let mut server = setup().await;
        let _get = remote_status(&mut server, "c1", "operational").await;
        let patch = component_patch(&mut server, "c1", "major_outage", 1).await;
        let _list = unresolved(&mut server, json!([])).await;
        let post = server
            .mock("POST", "/pages/page/incidents")
            .match_body(Matcher::PartialJson(json!({
                "incident": {
                    "name": "Service Issue - c1",
                    "status": "investigating",
                    "body": "https://svc.test/ is down.",
                    "component_ids": ["c1"]
                }
            })))
            .with_status(201)
            .with_body(r#"{"id":"inc1"}"#)
            .expect(1)
            .create_async()
            .await;
        let incident_patch =
            server.mock("PATCH", Matcher::Regex("^/pages/page/incidents/".into())).expect(0).create_async().await;

        let mut rec = reconciler(&server, true);
        let outcome = rec.reconcile("c1", StatusValue::MajorOutage, "https://svc.test/ is down.").await;

        assert_eq!(outcome, ReconcileOutcome::Updated(IncidentAction::Created("inc1".into())));
        patch.assert_async().await;
        post.assert_async().await;
        incident_patch.assert_async().await;
    }

    #[tokio::test]
    async fn outage_with_open_incident_updates_it() {
        let mut server = setup().await;
        let _get = remote_status(&mut server, "c1", "operational").await;
        let patch = component_patch(&mut server, "c1", "major_outage", 1).await;
        let _list = unresolved(
            &mut server,
            json!([
                {"id": "unrelated", "name": "Maintenance", "components": [{"id": "c9"}]},
                {"id": "i9", "name": "Service Issue - c1", "components": []}
            ]),
        )
        .await;
        let update = server
            .mock("PATCH", "/pages/page/incidents/i9")
            .match_body(Matcher::PartialJson(json!({
                "incident": {"status": "investigating", "body": "still down"}
            })))
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;
        let post = server.mock("POST", "/pages/page/incidents").expect(0).create_async().await;

        let mut rec = reconciler(&server, true);
        let outcome = rec.reconcile("c1", StatusValue::MajorOutage, "still down").await;

        assert_eq!(outcome, ReconcileOutcome::Updated(IncidentAction::Updated("i9".into())));
        patch.assert_async().await;
        update.assert_async().await;
        post.assert_async().await;
    }

    #[tokio::test]
    async fn recovery_resolves_every_matching_incident() {
        let mut server = setup().await;
        let _get = remote_status(&mut server, "c1", "major_outage").await;
        let patch = component_patch(&mut server, "c1", "operational", 1).await;
        let _list = unresolved(
            &mut server,
            json!([
                {"id": "i1", "name": "Service Issue - c1", "components": []},
                {"id": "i2", "name": "Legacy name", "components": [{"id": "c1"}]},
                {"id": "i3", "name": "Service Issue - c2", "components": [{"id": "c2"}]}
            ]),
        )
        .await;
        let mut resolves = Vec::new();
        for id in ["i1", "i2"] {
            resolves.push(
                server
                    .mock("PATCH", format!("/pages/page/incidents/{id}").as_str())
                    .match_body(Matcher::PartialJson(json!({
                        "incident": {"status": "resolved", "body": "The issue has been resolved."}
                    })))
                    .with_status(200)
                    .with_body("{}")
                    .expect(1)
                    .create_async()
                    .await,
            );
        }
        let untouched = server.mock("PATCH", "/pages/page/incidents/i3").expect(0).create_async().await;

        let mut rec = reconciler(&server, true);
        let outcome = rec.reconcile("c1", StatusValue::Operational, "back").await;

        assert_eq!(
            outcome,
            ReconcileOutcome::Updated(IncidentAction::Resolved(vec!["i1".into(), "i2".into()]))
        );
        patch.assert_async().await;
        for mock in resolves {
            mock.assert_async().await;
        }
        untouched.assert_async().await;
    }

    #[tokio::test]
    async fn unknown_remote_status_pushes_update() {
        let mut server = setup().await;
        let _get = server
            .mock("GET", "/pages/page/components/c1")
            .with_status(500)
            .create_async()
            .await;
        let patch = component_patch(&mut server, "c1", "operational", 1).await;
        let _list = unresolved(&mut server, json!([])).await;

        let mut rec = reconciler(&server, true);
        let outcome = rec.reconcile("c1", StatusValue::Operational, "ok").await;

        assert_eq!(outcome, ReconcileOutcome::Updated(IncidentAction::Resolved(vec![])));
        patch.assert_async().await;
    }

    #[tokio::test]
    async fn unauthorized_read_skips_rest_of_run() {
        let mut server = setup().await;
        let get = server
            .mock("GET", Matcher::Regex("^/pages/page/components/".into()))
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let patch = server.mock("PATCH", Matcher::Any).expect(0).create_async().await;

        let mut rec = reconciler(&server, true);
        assert_eq!(
            rec.reconcile("c1", StatusValue::MajorOutage, "down").await,
            ReconcileOutcome::Skipped(SkipReason::AuthFailed)
        );
        assert!(rec.auth_failed());
        assert_eq!(
            rec.reconcile("c2", StatusValue::MajorOutage, "down").await,
            ReconcileOutcome::Skipped(SkipReason::AuthFailed)
        );

        get.assert_async().await;
        patch.assert_async().await;
    }

    #[tokio::test]
    async fn failed_component_write_abandons_incident_writes() {
        let mut server = setup().await;
        let _get = remote_status(&mut server, "c1", "operational").await;
        let _patch = server
            .mock("PATCH", "/pages/page/components/c1")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;
        let list = server.mock("GET", "/pages/page/incidents/unresolved").expect(0).create_async().await;

        let mut rec = reconciler(&server, true);
        let outcome = rec.reconcile("c1", StatusValue::MajorOutage, "down").await;

        assert_eq!(outcome, ReconcileOutcome::Failed(FailedStep::UpdateComponent));
        assert!(!rec.auth_failed());
        list.assert_async().await;
    }

    #[tokio::test]
    async fn dry_run_reads_but_never_writes() {
        let mut server = setup().await;
        let _get = remote_status(&mut server, "c1", "operational").await;
        let _list = unresolved(&mut server, json!([])).await;
        let patch = server.mock("PATCH", Matcher::Any).expect(0).create_async().await;
        let post = server.mock("POST", Matcher::Any).expect(0).create_async().await;

        let mut rec = reconciler(&server, false);
        let outcome = rec.reconcile("c1", StatusValue::MajorOutage, "down").await;

        match outcome {
            ReconcileOutcome::Updated(IncidentAction::Created(id)) => assert!(id.starts_with("dryrun:")),
            other => panic!("unexpected outcome {other:?}"),
        }
        patch.assert_async().await;
        post.assert_async().await;
    }

    #[tokio::test]
    async fn unauthorized_write_latches_and_silences_later_calls() {
        let mut server = setup().await;
        let get = server
            .mock("GET", Matcher::Regex("^/pages/page/components/".into()))
            .with_status(200)
            .with_body(r#"{"id":"c1","status":"operational"}"#)
            .expect(1)
            .create_async()
            .await;
        let patch = server
            .mock("PATCH", "/pages/page/components/c1")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let list = server.mock("GET", "/pages/page/incidents/unresolved").expect(0).create_async().await;
        let post = server.mock("POST", Matcher::Any).expect(0).create_async().await;

        let mut rec = reconciler(&server, true);
        assert_eq!(
            rec.reconcile("c1", StatusValue::MajorOutage, "down").await,
            ReconcileOutcome::Skipped(SkipReason::AuthFailed)
        );
        assert!(rec.auth_failed());
        assert_eq!(
            rec.reconcile("c2", StatusValue::MajorOutage, "down").await,
            ReconcileOutcome::Skipped(SkipReason::AuthFailed)
        );

        get.assert_async().await;
        patch.assert_async().await;
        list.assert_async().await;
        post.assert_async().await;
    }

    #[tokio::test]
    async fn failed_incident_listing_opens_nothing() {
        let mut server = setup().await;
        let _get = remote_status(&mut server, "c1", "operational").await;
        let patch = component_patch(&mut server, "c1", "major_outage", 1).await;
        let list = server
            .mock("GET", "/pages/page/incidents/unresolved")
            .with_status(500)
            .with_body("unavailable")
            .expect(1)
            .create_async()
            .await;
        let post = server.mock("POST", "/pages/page/incidents").expect(0).create_async().await;

        let mut rec = reconciler(&server, true);
        let outcome = rec.reconcile("c1", StatusValue::MajorOutage, "down").await;

        assert_eq!(outcome, ReconcileOutcome::Failed(FailedStep::ListIncidents));
        assert!(!rec.auth_failed());
        patch.assert_async().await;
        list.assert_async().await;
        post.assert_async().await;
    }

    #[tokio::test]
    async fn failed_resolve_does_not_stop_the_others() {
        let mut server = setup().await;
        let _get = remote_status(&mut server, "c1", "major_outage").await;
        let _patch = component_patch(&mut server, "c1", "operational", 1).await;
        let _list = unresolved(
            &mut server,
            json!([
                {"id": "i1", "name": "Service Issue - c1", "components": []},
                {"id": "i2", "name": "Service Issue - c1", "components": []}
            ]),
        )
        .await;
        let first = server
            .mock("PATCH", "/pages/page/incidents/i1")
            .with_status(500)
            .with_body("boom")
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("PATCH", "/pages/page/incidents/i2")
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let mut rec = reconciler(&server, true);
        let outcome = rec.reconcile("c1", StatusValue::Operational, "back").await;

        assert_eq!(outcome, ReconcileOutcome::Updated(IncidentAction::Resolved(vec!["i2".into()])));
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn unmanaged_remote_status_is_overwritten() {
        let mut server = setup().await;
        let _get = remote_status(&mut server, "c1", "degraded_performance").await;
        let patch = component_patch(&mut server, "c1", "operational", 1).await;
        let _list = unresolved(&mut server, json!([])).await;

        let mut rec = reconciler(&server, true);
        let outcome = rec.reconcile("c1", StatusValue::Operational, "ok").await;

        assert_eq!(outcome, ReconcileOutcome::Updated(IncidentAction::Resolved(vec![])));
        patch.assert_async().await;
    }
}
