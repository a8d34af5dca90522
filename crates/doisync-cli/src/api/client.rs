//! HTTP API client for the doisync server

use crate::api::{endpoints, types::*};
use crate::error::{CliError, Result};
use doisync_common::types::Doi;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

// ============================================================================
// API Client Constants
// ============================================================================

/// Default timeout for API requests in seconds.
/// Can be overridden via DOISYNC_API_TIMEOUT_SECS. A re-run waits for the
/// whole retry budget.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 300;

/// Default server URL when not specified via environment variable.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// API client for the doisync server
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let timeout_secs = std::env::var("DOISYNC_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_API_TIMEOUT_SECS);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("DOISYNC_SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());

        Self::new(base_url)
    }

    /// Check server health
    pub async fn health_check(&self) -> Result<bool> {
        let url = endpoints::health_url(&self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Local record of a DOI
    pub async fn record(&self, doi: &Doi) -> Result<IdentifierRecord> {
        let response = self.client.get(endpoints::record_url(&self.base_url, doi)).send().await?;
        Self::data(doi, response).await
    }

    /// Local and remote state of a DOI
    pub async fn diagnose(&self, doi: &Doi) -> Result<Diagnostics> {
        let response = self
            .client
            .get(endpoints::diagnostics_url(&self.base_url, doi))
            .send()
            .await?;
        Self::data(doi, response).await
    }

    /// All FAILED records
    pub async fn list_failed(&self) -> Result<Vec<IdentifierRecord>> {
        let response = self.client.get(endpoints::failed_url(&self.base_url)).send().await?;
        let response = Self::check(None, response).await?;
        let api_response: ApiResponse<Vec<IdentifierRecord>> = response.json().await?;
        Ok(api_response.data)
    }

    /// Stored registration document of a DOI
    pub async fn export(&self, doi: &Doi) -> Result<String> {
        let response = self
            .client
            .get(endpoints::export_url(&self.base_url, doi))
            .send()
            .await?;
        Ok(Self::check(Some(doi), response).await?.text().await?)
    }

    /// Register the stored document again; waits for the outcome.
    pub async fn rerun(&self, doi: &Doi) -> Result<RerunResult> {
        let response = self
            .client
            .post(endpoints::rerun_url(&self.base_url, doi))
            .send()
            .await?;
        Self::data(doi, response).await
    }

    async fn data<T: DeserializeOwned>(doi: &Doi, response: Response) -> Result<T> {
        let response = Self::check(Some(doi), response).await?;
        let api_response: ApiResponse<T> = response.json().await?;
        Ok(api_response.data)
    }

    /// Turn an error status into a [`CliError`], reading the error envelope.
    async fn check(doi: Option<&Doi>, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::NOT_FOUND {
            if let Some(doi) = doi {
                return Err(CliError::NotFound(doi.to_string()));
            }
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or(body);

        tracing::debug!(status = status.as_u16(), %message, "Server returned an error");
        Err(CliError::api(status.as_u16(), message))
    }
}
