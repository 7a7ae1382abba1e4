//! HTTP client for the scheduling backend.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::types::{
    ConfigPayload, CreateFormRequest, CreatedForm, RemoteState, ScheduleOutcome,
};

/// Backend endpoints
mod endpoints {
    pub const CONFIG: &str = "/api/config";
    pub const CREATE_FORM: &str = "/api/create_form";
    pub const RUN_SCHEDULE: &str = "/api/run_schedule";
    pub const EXPORT_WORD: &str = "/export/word";
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} answered with HTTP {status}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
    },

    #[error("malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The backend answered with a non-success status and this message
    #[error("{0}")]
    Rejected(String),
}

/// Client for the config, form and scheduler services
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Where the backend serves the Word export of the last schedule
    pub fn export_url(&self) -> String {
        self.url(endpoints::EXPORT_WORD)
    }

    /// Push the current configuration. Any 2xx answer is accepted.
    pub async fn post_config(&self, payload: &ConfigPayload) -> Result<(), ApiError> {
        let endpoint = endpoints::CONFIG;
        debug!(
            num_days = payload.num_days,
            holidays = payload.holidays.len(),
            "Posting config"
        );
        let response = self
            .http
            .post(self.url(endpoint))
            .json(payload)
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;

        if !response.status().is_success() {
            return Err(ApiError::Status {
                endpoint,
                status: response.status(),
            });
        }
        Ok(())
    }

    /// Fetch the configuration the backend currently holds
    pub async fn fetch_config(&self) -> Result<RemoteState, ApiError> {
        let endpoint = endpoints::CONFIG;
        let response = self
            .http
            .get(self.url(endpoint))
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { endpoint, status });
        }
        let body = response
            .text()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;
        serde_json::from_str(&body).map_err(|source| ApiError::Decode { endpoint, source })
    }

    pub async fn create_form(&self, title: &str) -> Result<CreatedForm, ApiError> {
        let endpoint = endpoints::CREATE_FORM;
        let response = self
            .http
            .post(self.url(endpoint))
            .json(&CreateFormRequest { title })
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;

        read_envelope(endpoint, response).await
    }

    pub async fn run_schedule(&self) -> Result<ScheduleOutcome, ApiError> {
        let endpoint = endpoints::RUN_SCHEDULE;
        let response = self
            .http
            .post(self.url(endpoint))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;

        read_envelope(endpoint, response).await
    }
}

/// Decode a `{ "status": ..., ... }` envelope.
///
/// The backend reports failures as JSON with a 4xx/5xx code, so the body is
/// inspected before the HTTP status.
async fn read_envelope<T: DeserializeOwned>(
    endpoint: &'static str,
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| ApiError::Transport { endpoint, source })?;

    let value: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(_) if !status.is_success() => return Err(ApiError::Status { endpoint, status }),
        Err(source) => return Err(ApiError::Decode { endpoint, source }),
    };

    if value.get("status").and_then(Value::as_str) != Some("success") {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(ApiError::Rejected(message));
    }

    serde_json::from_value(value).map_err(|source| ApiError::Decode { endpoint, source })
}
