//! statuswatch configuration
use std::{convert::Infallible, fmt, path::PathBuf, time::Duration};

use clap::{ArgAction, Parser};
use eyre::{Result, eyre};
use primitives::retries::DEFAULT_PROBE_RETRIES;
use url::Url;

/// Services file model and loader
pub mod services;

pub use services::{ComponentSpec, ServiceSpec, ServiceTarget, ServicesConfig, TimeoutClass};

/// Default Statuspage REST API root.
pub const DEFAULT_STATUSPAGE_BASE_URL: &str = "https://api.statuspage.io/v1";

/// Default WakaTime REST API root.
pub const DEFAULT_WAKATIME_BASE_URL: &str = "https://wakatime.com/api/v1";

/// Statuspage API configuration options
#[derive(Debug, Clone, Parser)]
pub struct StatuspageOpts {
    /// Statuspage API key
    #[clap(long = "statuspage-api-key", env = "STATUSPAGE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    /// Statuspage page ID
    #[clap(long = "page-id", env = "PAGE_ID")]
    pub page_id: Option<String>,
    /// Statuspage API base URL
    #[clap(
        long = "statuspage-base-url",
        env = "STATUSPAGE_BASE_URL",
        default_value = DEFAULT_STATUSPAGE_BASE_URL
    )]
    pub base_url: Url,
}

/// Health probe configuration options
#[derive(Debug, Clone, Parser)]
pub struct ProbeOpts {
    /// Number of retries after a failed probe attempt
    #[clap(long = "probe-retries", env = "PROBE_RETRIES", default_value_t = DEFAULT_PROBE_RETRIES)]
    pub retries: u32,
    /// Seconds to wait before re-probing a service whose components are all down
    #[clap(long = "probe-confirm-delay-secs", env = "PROBE_CONFIRM_DELAY_SECS", default_value = "10")]
    pub confirm_delay_secs: u64,
}

impl ProbeOpts {
    /// Delay before the confirmation probe.
    pub const fn confirm_delay(&self) -> Duration {
        Duration::from_secs(self.confirm_delay_secs)
    }
}

/// CLI options for status-sync
#[derive(Debug, Clone, Parser)]
#[clap(name = "status-sync", about = "Mirror service health onto a Statuspage page")]
pub struct StatusSyncOpts {
    /// Path to the services JSON document
    #[clap(long, env = "SERVICES_CONFIG", default_value = "services_config.json")]
    pub config: PathBuf,

    /// Statuspage API configuration
    #[clap(flatten)]
    pub statuspage: StatuspageOpts,

    /// Health probe configuration
    #[clap(flatten)]
    pub probe: ProbeOpts,

    /// Skip real probes and report every service as a major outage
    #[clap(
        long,
        env = "TEST_MODE",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = parse_flag
    )]
    pub test_mode: bool,

    /// Read from Statuspage but only log the writes that would happen
    #[clap(
        long,
        env = "DRY_RUN",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = parse_flag
    )]
    pub dry_run: bool,
}

impl StatusSyncOpts {
    /// Validate the Statuspage credentials.
    ///
    /// Returns `Ok(None)` when credentials are missing in test mode, and an
    /// error when they are missing otherwise.
    pub fn credentials(&self) -> Result<Option<Credentials>> {
        let api_key = non_empty(self.statuspage.api_key.as_deref());
        let page_id = non_empty(self.statuspage.page_id.as_deref());

        match (api_key, page_id) {
            (Some(api_key), Some(page_id)) => Ok(Some(Credentials {
                api_key: api_key.to_owned(),
                page_id: page_id.to_owned(),
                base_url: self.statuspage.base_url.clone(),
            })),
            _ if self.test_mode => Ok(None),
            (api_key, page_id) => Err(eyre!(
                "missing required Statuspage credentials (STATUSPAGE_API_KEY: {}, PAGE_ID: {})",
                set_or_not(api_key),
                set_or_not(page_id)
            )),
        }
    }
}

/// Validated Statuspage credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Statuspage API key
    pub api_key: String,
    /// Statuspage page ID
    pub page_id: String,
    /// Statuspage API base URL
    pub base_url: Url,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("page_id", &self.page_id)
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// WakaTime API configuration options
#[derive(Clone, Parser)]
pub struct WakaTimeOpts {
    /// WakaTime API key
    #[clap(long = "wakatime-api-key", env = "WAKATIME_API_KEY", hide_env_values = true)]
    pub api_key: String,
    /// WakaTime username whose projects are listed
    #[clap(long = "wakatime-username", env = "WAKATIME_USERNAME", default_value = "current")]
    pub username: String,
    /// WakaTime API base URL
    #[clap(long = "wakatime-base-url", env = "WAKATIME_BASE_URL", default_value = DEFAULT_WAKATIME_BASE_URL)]
    pub base_url: Url,
}

impl fmt::Debug for WakaTimeOpts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WakaTimeOpts")
            .field("username", &self.username)
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// README rewrite options
#[derive(Debug, Clone, Parser)]
pub struct ReadmeOpts {
    /// README file to rewrite
    #[clap(long = "readme-path", env = "README_PATH", default_value = "README.md")]
    pub path: PathBuf,
    /// GitHub user that owns the linked project repositories
    #[clap(long = "github-user", env = "README_GITHUB_USER")]
    pub github_user: String,
    /// Maximum number of projects listed on the line
    #[clap(long = "max-projects", env = "README_MAX_PROJECTS", default_value = "2")]
    pub max_projects: usize,
    /// Prefix of the line after which the project line is inserted when absent
    #[clap(long = "anchor", env = "README_ANCHOR")]
    pub anchor: Option<String>,
}

/// CLI options for readme-updater
#[derive(Debug, Clone, Parser)]
#[clap(name = "readme-updater", about = "Rewrite the README project line from WakaTime activity")]
pub struct ReadmeUpdaterOpts {
    /// WakaTime API configuration
    #[clap(flatten)]
    pub wakatime: WakaTimeOpts,

    /// README rewrite options
    #[clap(flatten)]
    pub readme: ReadmeOpts,
}

/// Lenient boolean for environment flags: `true`, `1`, `yes` and `on` in any
/// case are true, every other value is false.
fn parse_flag(value: &str) -> Result<bool, Infallible> {
    let value = value.trim();
    Ok(["true", "1", "yes", "on"].iter().any(|t| value.eq_ignore_ascii_case(t)))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

const fn set_or_not(value: Option<&str>) -> &'static str {
    if value.is_some() { "set" } else { "not set" }
}
