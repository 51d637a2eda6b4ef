use std::time::Duration;

use config::Credentials;
use primitives::StatusValue;
use reqwest::{
    Client as HttpClient, RequestBuilder, Response, StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde::Deserialize;
use url::Url;

use crate::payload::{
    ComponentEnvelope, ComponentPatch, Incident, IncidentEnvelope, IncidentUpdate, NewIncident,
};

const READ_TIMEOUT: Duration = Duration::from_secs(10);
const WRITE_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors returned by the Statuspage API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// HTTP 401: invalid API key or page ID.
    #[error("authentication failed - invalid API key or page ID")]
    Unauthorized,
    /// Any other non-success response.
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

/// Client for interacting with the Statuspage API.
#[derive(Clone)]
pub struct Client {
    http: HttpClient,
    api_key: String,
    page_id: String,
    base_url: Url,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("page_id", &self.page_id)
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a new Statuspage API client.
    pub fn new(credentials: &Credentials) -> Self {
        Self::with_base_url(
            credentials.api_key.clone(),
            credentials.page_id.clone(),
            credentials.base_url.clone(),
        )
    }

    /// Create a client talking to `base_url` instead of the public API.
    pub fn with_base_url(api_key: String, page_id: String, base_url: Url) -> Self {
        Self { http: HttpClient::new(), api_key, page_id, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/pages/{}/{}", self.base_url.as_str().trim_end_matches('/'), self.page_id, path)
    }

    /// Authenticate the request.
    fn auth(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.header(AUTHORIZATION, format!("OAuth {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
    }

    /// Current remote status string of `component_id`.
    pub async fn component_status(&self, component_id: &str) -> Result<String, ApiError> {
        #[derive(Deserialize)]
        struct Resp {
            status: String,
        }
        let url = self.url(&format!("components/{component_id}"));
        let resp = send(self.auth(self.http.get(&url)).timeout(READ_TIMEOUT)).await?;
        Ok(resp.json::<Resp>().await?.status)
    }

    /// Set the status of `component_id`.
    pub async fn update_component(
        &self,
        component_id: &str,
        status: StatusValue,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("components/{component_id}"));
        let body = ComponentEnvelope { component: ComponentPatch { status } };
        send(self.auth(self.http.patch(&url)).json(&body).timeout(WRITE_TIMEOUT)).await?;
        Ok(())
    }

    /// All incidents the page currently reports as unresolved.
    pub async fn unresolved_incidents(&self) -> Result<Vec<Incident>, ApiError> {
        let url = self.url("incidents/unresolved");
        let resp = send(self.auth(self.http.get(&url)).timeout(READ_TIMEOUT)).await?;
        Ok(resp.json::<Vec<Incident>>().await?)
    }

    /// Create a new incident, returning its ID.
    pub async fn create_incident(&self, body: &NewIncident) -> Result<String, ApiError> {
        #[derive(Deserialize)]
        struct Resp {
            id: String,
        }
        let url = self.url("incidents");
        let resp = send(
            self.auth(self.http.post(&url))
                .json(&IncidentEnvelope { incident: body })
                .timeout(WRITE_TIMEOUT),
        )
        .await?;
        Ok(resp.json::<Resp>().await?.id)
    }

    /// Update the status and body of an existing incident.
    pub async fn update_incident(&self, id: &str, body: &IncidentUpdate) -> Result<(), ApiError> {
        let url = self.url(&format!("incidents/{id}"));
        send(
            self.auth(self.http.patch(&url))
                .json(&IncidentEnvelope { incident: body })
                .timeout(WRITE_TIMEOUT),
        )
        .await?;
        Ok(())
    }
}

async fn send(rb: RequestBuilder) -> Result<Response, ApiError> {
    let resp = rb.send().await?;
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Status { status, body });
    }
    Ok(resp)
}
