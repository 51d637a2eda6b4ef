use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use config::WakaTimeOpts;
use reqwest::{Client as HttpClient, StatusCode, header::AUTHORIZATION};
use serde::Deserialize;
use url::Url;

use crate::projects::ProjectRecord;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors returned by the WakaTime API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Any non-success response.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// Response status
        status: StatusCode,
        /// Response body, for diagnostics
        body: String,
    },
    /// Transport or decoding failure.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Client for the WakaTime projects listing.
#[derive(Clone)]
pub struct WakaTimeClient {
    http: HttpClient,
    api_key: String,
    username: String,
    base_url: Url,
}

impl std::fmt::Debug for WakaTimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WakaTimeClient")
            .field("username", &self.username)
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl WakaTimeClient {
    /// Create a client from CLI options.
    pub fn new(opts: &WakaTimeOpts) -> Self {
        Self::with_base_url(opts.api_key.clone(), opts.username.clone(), opts.base_url.clone())
    }

    /// Create a client talking to `base_url`.
    pub fn with_base_url(api_key: String, username: String, base_url: Url) -> Self {
        Self { http: HttpClient::new(), api_key, username, base_url }
    }

    fn auth_header(&self) -> String {
        format!("Basic {}", STANDARD.encode(&self.api_key))
    }

    /// Every project of the user with its last heartbeat time.
    pub async fn recent_projects(&self) -> Result<Vec<ProjectRecord>, ApiError> {
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            data: Vec<ProjectRecord>,
        }

        let url = format!(
            "{}/users/{}/projects",
            self.base_url.as_str().trim_end_matches('/'),
            self.username
        );
        let resp = self
            .http
            .get(&url)
            .header(AUTHORIZATION, self.auth_header())
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }
        Ok(resp.json::<Resp>().await?.data)
    }
}
