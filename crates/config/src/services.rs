use std::{collections::HashSet, fs, path::Path, time::Duration};

use eyre::{Result, WrapErr};
use primitives::retries::TimeoutSchedule;
use serde::Deserialize;
use url::Url;

/// Hosts whose free tiers spin services down and need a long first response.
pub const COLD_START_HOST_SUFFIXES: &[&str] = &["onrender.com"];

/// The `{ "services": [...] }` document loaded once per run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServicesConfig {
    /// Monitored services, probed in order
    pub services: Vec<ServiceSpec>,
}

impl ServicesConfig {
    /// Read and parse the services document at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read services config {}", path.display()))?;
        Self::from_json(&raw)
            .wrap_err_with(|| format!("failed to parse services config {}", path.display()))
    }

    /// Parse a services document.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// A named sub-component of a multi-component service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ComponentSpec {
    /// Key reported in the service's health body
    pub name: String,
    /// Statuspage component ID
    pub component_id: String,
}

/// What a service maps to on the status page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceTarget {
    /// Whole service reported as one component.
    Single {
        /// Statuspage component ID
        component_id: String,
    },
    /// Service reports `name=flag` lines, one per component.
    Multi {
        /// Configured components, in config order
        components: Vec<ComponentSpec>,
    },
}

/// Probe timeout class of a service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutClass {
    /// 5s growing to at most 15s.
    #[default]
    Standard,
    /// 15s growing to at most 30s.
    ColdStart,
    /// 30s growing to at most 45s.
    Flaky,
}

impl TimeoutClass {
    /// Per-attempt timeouts for the class.
    pub const fn schedule(self) -> TimeoutSchedule {
        let (base, cap) = match self {
            Self::Standard => (5, 15),
            Self::ColdStart => (15, 30),
            Self::Flaky => (30, 45),
        };
        TimeoutSchedule::new(Duration::from_secs(base), Duration::from_secs(cap))
    }

    /// Class implied by the service host.
    pub fn for_url(url: &Url) -> Self {
        let Some(host) = url.host_str() else { return Self::Standard };
        let cold = COLD_START_HOST_SUFFIXES.iter().any(|suffix| {
            host == *suffix || host.strip_suffix(suffix).is_some_and(|rest| rest.ends_with('.'))
        });
        if cold { Self::ColdStart } else { Self::Standard }
    }
}

/// Errors rejecting a malformed service entry.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ServiceSpecError {
    /// Both `component_id` and `components` were given.
    #[error("service {0} sets both component_id and components")]
    BothTargets(Url),
    /// Neither `component_id` nor `components` was given.
    #[error("service {0} sets neither component_id nor components")]
    NoTarget(Url),
    /// `components` was an empty list.
    #[error("service {0} has an empty components list")]
    EmptyComponents(Url),
    /// The same component name appears twice.
    #[error("service {url} lists component {name} more than once")]
    DuplicateComponent {
        /// Service URL
        url: Url,
        /// Repeated component name
        name: String,
    },
}

#[derive(Deserialize)]
struct RawServiceSpec {
    url: Url,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    component_id: Option<String>,
    #[serde(default)]
    components: Option<Vec<ComponentSpec>>,
    #[serde(default)]
    timeout_class: Option<TimeoutClass>,
}

/// One monitored service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawServiceSpec")]
pub struct ServiceSpec {
    /// Health endpoint
    pub url: Url,
    /// Optional display name used in logs
    pub name: Option<String>,
    /// Status page mapping
    pub target: ServiceTarget,
    timeout_class: Option<TimeoutClass>,
}

impl TryFrom<RawServiceSpec> for ServiceSpec {
    type Error = ServiceSpecError;

    fn try_from(raw: RawServiceSpec) -> Result<Self, Self::Error> {
        let target = match (raw.component_id, raw.components) {
            (Some(_), Some(_)) => return Err(ServiceSpecError::BothTargets(raw.url)),
            (None, None) => return Err(ServiceSpecError::NoTarget(raw.url)),
            (Some(component_id), None) => ServiceTarget::Single { component_id },
            (None, Some(components)) => {
                if components.is_empty() {
                    return Err(ServiceSpecError::EmptyComponents(raw.url));
                }
                let mut seen = HashSet::new();
                if let Some(dup) = components.iter().find(|c| !seen.insert(c.name.as_str())) {
                    return Err(ServiceSpecError::DuplicateComponent {
                        name: dup.name.clone(),
                        url: raw.url,
                    });
                }
                ServiceTarget::Multi { components }
            }
        };

        Ok(Self { url: raw.url, name: raw.name, target, timeout_class: raw.timeout_class })
    }
}

impl ServiceSpec {
    /// Single-component service.
    pub fn single(url: Url, component_id: impl Into<String>) -> Self {
        Self {
            url,
            name: None,
            target: ServiceTarget::Single { component_id: component_id.into() },
            timeout_class: None,
        }
    }

    /// Multi-component service from `(name, component_id)` pairs.
    pub fn multi<'a>(url: Url, components: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let components = components
            .into_iter()
            .map(|(name, id)| ComponentSpec { name: name.to_owned(), component_id: id.to_owned() })
            .collect();
        Self { url, name: None, target: ServiceTarget::Multi { components }, timeout_class: None }
    }

    /// Explicit timeout class, or the one implied by the host.
    pub fn timeout_class(&self) -> TimeoutClass {
        self.timeout_class.unwrap_or_else(|| TimeoutClass::for_url(&self.url))
    }

    /// Name for logs: the configured name, else the URL host.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().or_else(|| self.url.host_str()).unwrap_or(self.url.as_str())
    }
}
