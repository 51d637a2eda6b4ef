use std::{collections::BTreeMap, time::Duration};

use config::{ServiceSpec, ServiceTarget};
use eyre::{Report, Result, eyre};
use primitives::{
    StatusValue,
    retries::{Jitter, TimeoutSchedule, retry_with_jitter_if},
};
use reqwest::{Client, StatusCode};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

/// Status of one status page component after probing its service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentProbe {
    /// Component name for multi-component services
    pub name: Option<String>,
    /// Statuspage component ID
    pub component_id: String,
    /// Freshly probed status
    pub status: StatusValue,
    /// Human readable message used as the incident body
    pub message: String,
}

/// Result of probing a single service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Probed URL
    pub url: Url,
    /// One entry per configured component
    pub components: Vec<ComponentProbe>,
}

impl ProbeOutcome {
    /// A service is outaged when any of its components is not operational.
    pub fn is_outaged(&self) -> bool {
        self.components.iter().any(|c| !c.status.is_operational())
    }
}

/// Runs health probes against monitored services.
#[derive(Debug, Clone)]
pub struct ProbeExecutor {
    http: Client,
    retries: u32,
    jitter: Jitter,
    confirm_delay: Duration,
    test_mode: bool,
}

impl ProbeExecutor {
    /// Create an executor retrying failed attempts `retries` times.
    pub fn new(retries: u32, confirm_delay: Duration) -> Self {
        Self { http: Client::new(), retries, jitter: Jitter::DEFAULT, confirm_delay, test_mode: false }
    }

    /// Replace the jitter slept before every attempt.
    #[must_use]
    pub const fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// In test mode no request is sent and every service reports a major outage.
    #[must_use]
    pub const fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    /// Probe `service` and map the result onto its configured components.
    pub async fn probe(&self, service: &ServiceSpec) -> ProbeOutcome {
        let schedule = service.timeout_class().schedule();

        let components = match &service.target {
            ServiceTarget::Single { component_id } => {
                let (status, message) = self.probe_single(&service.url, schedule).await;
                vec![ComponentProbe { name: None, component_id: component_id.clone(), status, message }]
            }
            ServiceTarget::Multi { components } => {
                let names: Vec<&str> = components.iter().map(|c| c.name.as_str()).collect();
                let (mut statuses, mut message) =
                    self.probe_components(&service.url, &names, schedule).await;

                let total_outage = names
                    .iter()
                    .all(|n| statuses.get(*n).is_none_or(|s| !s.is_operational()));
                if !self.test_mode && total_outage {
                    info!(
                        url = service.url.as_str(),
                        delay_secs = self.confirm_delay.as_secs_f64(),
                        "all components down, confirming outage"
                    );
                    tokio::time::sleep(self.confirm_delay).await;
                    (statuses, message) = self.probe_components(&service.url, &names, schedule).await;
                }

                components
                    .iter()
                    .map(|c| {
                        let status =
                            statuses.get(&c.name).copied().unwrap_or(StatusValue::MajorOutage);
                        ComponentProbe {
                            name: Some(c.name.clone()),
                            component_id: c.component_id.clone(),
                            status,
                            message: format!("{} status: {}. {}", c.name, status, message),
                        }
                    })
                    .collect()
            }
        };

        ProbeOutcome { url: service.url.clone(), components }
    }

    /// Probe a single-component service: HTTP 200 is operational, anything else an outage.
    pub async fn probe_single(&self, url: &Url, schedule: TimeoutSchedule) -> (StatusValue, String) {
        if self.test_mode {
            info!(url = url.as_str(), "test mode status: major_outage");
            return (StatusValue::MajorOutage, format!("Simulated outage for testing {url}."));
        }

        match self.fetch(url, schedule).await {
            Ok(_) => {
                info!(url = url.as_str(), status = %StatusValue::Operational, "service status");
                (StatusValue::Operational, format!("{url} is operational."))
            }
            Err(_) => {
                info!(url = url.as_str(), status = %StatusValue::MajorOutage, "service status");
                (StatusValue::MajorOutage, format!("{url} is down."))
            }
        }
    }

    /// Probe a multi-component service reporting `name=flag` lines.
    ///
    /// An unreachable service or unparseable body marks every name in `names`
    /// as a major outage.
    pub async fn probe_components(
        &self,
        url: &Url,
        names: &[&str],
        schedule: TimeoutSchedule,
    ) -> (BTreeMap<String, StatusValue>, String) {
        let all_down = || -> BTreeMap<String, StatusValue> {
            names.iter().map(|n| ((*n).to_owned(), StatusValue::MajorOutage)).collect()
        };

        if self.test_mode {
            info!(url = url.as_str(), "test mode status: all components major_outage");
            return (all_down(), format!("Simulated outage for testing {url}."));
        }

        let body = match self.fetch(url, schedule).await {
            Ok(body) => body,
            Err(_) => {
                info!(url = url.as_str(), status = %StatusValue::MajorOutage, "service status");
                return (all_down(), format!("{url} is down."));
            }
        };

        match crate::health_body::parse_health_body(&body) {
            Some(statuses) => {
                info!(url = url.as_str(), ?statuses, "service status");
                (statuses, format!("{url} health check completed with components status."))
            }
            None => {
                let snippet = body.chars().take(200).collect::<String>();
                warn!(url = url.as_str(), body = %snippet, "unparseable health body");
                (all_down(), format!("{url} returned an unparseable health body."))
            }
        }
    }

    /// GET `url` until it answers 200, returning the body.
    async fn fetch(&self, url: &Url, schedule: TimeoutSchedule) -> Result<String> {
        let last_attempt = self.retries;
        let result = retry_with_jitter_if(
            self.retries,
            self.jitter,
            |attempt| {
                let limit = schedule.timeout_for(attempt);
                async move {
                    let res = get_once(&self.http, url, limit).await;
                    if let Err(e) = &res {
                        if attempt < last_attempt {
                            debug!(
                                error = %e,
                                url = url.as_str(),
                                attempt,
                                timeout_ms = limit.as_millis(),
                                "probe attempt failed, retrying"
                            );
                        }
                    }
                    res
                }
            },
            |_: &Report| true,
        )
        .await;

        if let Err(e) = &result {
            warn!(error = %e, url = url.as_str(), attempts = last_attempt + 1, "probe failed");
        }
        result
    }
}

async fn get_once(client: &Client, url: &Url, limit: Duration) -> Result<String> {
    let request = async {
        let resp = client.get(url.clone()).send().await?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Err(eyre!("unexpected status {status}"));
        }
        Ok::<_, Report>(resp.text().await?)
    };

    timeout(limit, request)
        .await
        .map_err(|_| eyre!("request timed out after {}ms", limit.as_millis()))?
}
