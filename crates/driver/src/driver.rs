//! statuswatch Driver - probes services and reconciles the status page

use config::{ServicesConfig, StatusSyncOpts};
use eyre::Result;
use incident::{Client as IncidentClient, StatusReconciler};
use network::ProbeExecutor;
use tracing::{info, warn};

use crate::report::{RunReport, ServiceReport};

/// Runs one pass over every configured service.
#[derive(Debug)]
pub struct Driver {
    services: ServicesConfig,
    probe: ProbeExecutor,
    reconciler: Option<StatusReconciler>,
}

impl Driver {
    /// Create a new driver with the given configuration.
    ///
    /// Fails when Statuspage credentials are missing outside test mode, or
    /// when the services document cannot be read or parsed.
    pub fn new(opts: &StatusSyncOpts) -> Result<Self> {
        info!("Initializing driver");

        // verify credentials before doing any heavy work
        let credentials = opts.credentials()?;
        let services = ServicesConfig::load(&opts.config)?;

        let probe = ProbeExecutor::new(opts.probe.retries, opts.probe.confirm_delay())
            .with_test_mode(opts.test_mode);

        let reconciler = match credentials {
            Some(credentials) => {
                Some(StatusReconciler::new(IncidentClient::new(&credentials), !opts.dry_run))
            }
            None => {
                warn!("Statuspage credentials not set - status page will not be updated");
                None
            }
        };

        if opts.test_mode {
            warn!("Test mode enabled - probes are simulated");
        }

        info!(services = services.services.len(), "Loaded services config");
        Ok(Self::from_parts(services, probe, reconciler))
    }

    /// Assemble a driver from already built components.
    pub const fn from_parts(
        services: ServicesConfig,
        probe: ProbeExecutor,
        reconciler: Option<StatusReconciler>,
    ) -> Self {
        Self { services, probe, reconciler }
    }

    /// Probe every service in order and reconcile each of its components.
    pub async fn run(&mut self) -> RunReport {
        let mut report = RunReport::default();

        for service in &self.services.services {
            let probe = self.probe.probe(service).await;

            let mut reconciled = Vec::with_capacity(probe.components.len());
            if let Some(reconciler) = self.reconciler.as_mut() {
                for component in &probe.components {
                    let outcome = reconciler
                        .reconcile(&component.component_id, component.status, &component.message)
                        .await;
                    reconciled.push((component.component_id.clone(), outcome));
                }
            }

            let service_report = ServiceReport { probe, reconciled };
            if service_report.is_outaged() {
                warn!(service = service.display_name(), url = service.url.as_str(), "Service outage");
            } else {
                info!(service = service.display_name(), "Service operational");
            }
            report.services.push(service_report);
        }

        report
    }
}
