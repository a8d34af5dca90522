//! Registration service client
//!
//! [`RegistrationClient`] is the seam between the engine and the external
//! registration service. [`DataCiteClient`] talks to the DataCite MDS API.
//! Raw call failures come back as [`ProviderError`] and are sorted into
//! retry classes by [`classify`].

use super::error::DoiError;
use crate::config::DataCiteConfig;
use async_trait::async_trait;
use doisync_common::types::{Doi, DoiStatus};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Raw outcome of a failed provider call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("registration service answered HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("registration service unreachable: {0}")]
    Connection(String),

    #[error("registration service timed out: {0}")]
    Timeout(String),

    #[error("unexpected response from registration service: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() {
            ProviderError::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            ProviderError::Http {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            ProviderError::Protocol(err.to_string())
        }
    }
}

/// Retry class of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transient,
    SizeRejected,
    Unrecoverable,
}

/// Sort a provider failure into its retry class.
pub fn classify(err: &ProviderError) -> FailureKind {
    match err {
        ProviderError::Http { status: 413, .. } => FailureKind::SizeRejected,
        ProviderError::Http { status, .. } if *status == 408 || *status == 429 => {
            FailureKind::Transient
        },
        ProviderError::Http { status, .. } if *status >= 500 => FailureKind::Transient,
        ProviderError::Http { .. } => FailureKind::Unrecoverable,
        ProviderError::Connection(_) | ProviderError::Timeout(_) => FailureKind::Transient,
        ProviderError::Protocol(_) => FailureKind::Unrecoverable,
    }
}

impl ProviderError {
    pub fn kind(&self) -> FailureKind {
        classify(self)
    }

    /// Convert into the engine taxonomy for `doi`.
    pub fn into_doi_error(self, doi: &Doi) -> DoiError {
        let doi = doi.clone();
        let message = self.to_string();
        match classify(&self) {
            FailureKind::Transient => DoiError::Transient { doi, message },
            FailureKind::SizeRejected => DoiError::SizeRejected { doi, message },
            FailureKind::Unrecoverable => DoiError::Unrecoverable { doi, message },
        }
    }
}

/// What the registration service knows about a DOI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteDoi {
    /// `Registered` or `Reserved`
    pub status: DoiStatus,
    pub target: Option<Url>,
}

#[async_trait]
pub trait RegistrationClient: Send + Sync {
    /// Register or update a DOI with its landing page and document.
    async fn register(&self, doi: &Doi, target: &Url, document: &str) -> Result<(), ProviderError>;

    /// Upload the document without making the DOI resolvable.
    async fn reserve(&self, doi: &Doi, document: &str) -> Result<(), ProviderError>;

    /// Remove a reserved DOI.
    async fn delete(&self, doi: &Doi) -> Result<(), ProviderError>;

    /// `None` when the service has never heard of the DOI.
    async fn resolve(&self, doi: &Doi) -> Result<Option<RemoteDoi>, ProviderError>;

    /// Document currently held by the service.
    async fn metadata(&self, doi: &Doi) -> Result<Option<String>, ProviderError>;
}

/// DataCite MDS API client
pub struct DataCiteClient {
    client: Client,
    base_url: Url,
    username: String,
    password: String,
}

impl DataCiteClient {
    pub fn new(config: &DataCiteConfig) -> anyhow::Result<Self> {
        let mut base_url = Url::parse(&config.api_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn url(&self, resource: &str, doi: &Doi) -> Result<Url, ProviderError> {
        self.base_url
            .join(&format!("{}/{}", resource, doi.doi_name()))
            .map_err(|e| ProviderError::Protocol(e.to_string()))
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
    }

    async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::Http {
            status: status.as_u16(),
            body,
        })
    }

    async fn put_metadata(&self, doi: &Doi, document: &str) -> Result<(), ProviderError> {
        let response = self
            .request(reqwest::Method::PUT, self.url("metadata", doi)?)
            .header(reqwest::header::CONTENT_TYPE, "application/xml;charset=UTF-8")
            .body(document.to_string())
            .send()
            .await?;
        Self::expect_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl RegistrationClient for DataCiteClient {
    async fn register(&self, doi: &Doi, target: &Url, document: &str) -> Result<(), ProviderError> {
        self.put_metadata(doi, document).await?;

        let response = self
            .request(reqwest::Method::PUT, self.url("doi", doi)?)
            .header(reqwest::header::CONTENT_TYPE, "text/plain;charset=UTF-8")
            .body(format!("doi={}\nurl={}", doi.doi_name(), target))
            .send()
            .await?;
        Self::expect_success(response).await?;

        tracing::debug!(%doi, %target, "DOI registered with DataCite");
        Ok(())
    }

    async fn reserve(&self, doi: &Doi, document: &str) -> Result<(), ProviderError> {
        self.put_metadata(doi, document).await?;
        tracing::debug!(%doi, "DOI reserved with DataCite");
        Ok(())
    }

    async fn delete(&self, doi: &Doi) -> Result<(), ProviderError> {
        let response = self
            .request(reqwest::Method::DELETE, self.url("doi", doi)?)
            .send()
            .await?;
        Self::expect_success(response).await?;
        tracing::debug!(%doi, "DOI deleted from DataCite");
        Ok(())
    }

    async fn resolve(&self, doi: &Doi) -> Result<Option<RemoteDoi>, ProviderError> {
        let response = self
            .request(reqwest::Method::GET, self.url("doi", doi)?)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::NO_CONTENT => Ok(Some(RemoteDoi {
                status: DoiStatus::Reserved,
                target: None,
            })),
            _ => {
                let body = Self::expect_success(response).await?.text().await?;
                let target = Url::parse(body.trim()).map_err(|e| {
                    ProviderError::Protocol(format!("invalid target '{}': {}", body.trim(), e))
                })?;
                Ok(Some(RemoteDoi {
                    status: DoiStatus::Registered,
                    target: Some(target),
                }))
            },
        }
    }

    async fn metadata(&self, doi: &Doi) -> Result<Option<String>, ProviderError> {
        let response = self
            .request(reqwest::Method::GET, self.url("metadata", doi)?)
            .header(reqwest::header::ACCEPT, "application/xml")
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::GONE => Ok(None),
            _ => Ok(Some(Self::expect_success(response).await?.text().await?)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn http(status: u16) -> ProviderError {
        ProviderError::Http {
            status,
            body: String::new(),
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&http(413)), FailureKind::SizeRejected);
        assert_eq!(classify(&http(500)), FailureKind::Transient);
        assert_eq!(classify(&http(503)), FailureKind::Transient);
        assert_eq!(classify(&http(429)), FailureKind::Transient);
        assert_eq!(classify(&http(408)), FailureKind::Transient);
        assert_eq!(classify(&http(400)), FailureKind::Unrecoverable);
        assert_eq!(classify(&http(401)), FailureKind::Unrecoverable);
        assert_eq!(classify(&http(422)), FailureKind::Unrecoverable);
        assert_eq!(
            classify(&ProviderError::Timeout("slow".into())),
            FailureKind::Transient
        );
        assert_eq!(
            classify(&ProviderError::Connection("refused".into())),
            FailureKind::Transient
        );
        assert_eq!(
            classify(&ProviderError::Protocol("garbage".into())),
            FailureKind::Unrecoverable
        );
    }

    #[test]
    fn test_into_doi_error() {
        let doi: Doi = "10.21373/abc".parse().unwrap();
        assert!(matches!(
            http(413).into_doi_error(&doi),
            DoiError::SizeRejected { .. }
        ));
        assert!(http(502).into_doi_error(&doi).is_transient());
    }
}
