//! Per-run results and the process exit code derived from them.

use incident::ReconcileOutcome;
use network::ProbeOutcome;

/// Overall verdict of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every component of every service is operational.
    Healthy,
    /// At least one component is not operational.
    Degraded,
}

impl RunOutcome {
    /// `0` when healthy, `1` when degraded.
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Healthy => 0,
            Self::Degraded => 1,
        }
    }
}

/// What happened to one service during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReport {
    /// Probe result for every configured component
    pub probe: ProbeOutcome,
    /// Reconciliation outcome per component ID; empty when no reconciler was configured
    pub reconciled: Vec<(String, ReconcileOutcome)>,
}

impl ServiceReport {
    /// Whether any component of the service is down.
    pub fn is_outaged(&self) -> bool {
        self.probe.is_outaged()
    }
}

/// Results of all services, in config order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// One report per configured service
    pub services: Vec<ServiceReport>,
}

impl RunReport {
    /// `Degraded` if any service is outaged.
    pub fn outcome(&self) -> RunOutcome {
        if self.services.iter().any(ServiceReport::is_outaged) {
            RunOutcome::Degraded
        } else {
            RunOutcome::Healthy
        }
    }

    /// Number of outaged services.
    pub fn outaged_count(&self) -> usize {
        self.services.iter().filter(|s| s.is_outaged()).count()
    }
}
