//! Minting and registration facade
//!
//! [`DoiGenerator`] is what the rest of the registry talks to. It mints new
//! DOIs into the record store, validates documents, and hands the network
//! work to the change-message queue. Nothing here waits for the
//! registration service.

use super::error::{DoiError, DoiResult};
use super::metadata::{to_xml, DataCiteMetadata};
use super::queue::{ChangeDoiMessage, MessagePublisher};
use super::store::{DoiData, DoiStore};
use crate::config::DoiConfig;
use crate::db::DbError;
use doisync_common::logging::ALERT_TARGET;
use doisync_common::types::{Doi, DoiStatus, DoiType};
use rand::Rng;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

/// Alphabet for random suffixes; 0, 1, i, l and o are left out.
pub const DOI_CHARACTERS: &[u8] = b"23456789abcdefghjkmnpqrstuvwxyz";
pub const RANDOM_LENGTH: usize = 6;
pub const MAX_MINT_ATTEMPTS: usize = 1000;

pub struct DoiGenerator {
    prefix: String,
    dataset_base: Url,
    download_base: Url,
    store: Arc<dyn DoiStore>,
    publisher: Arc<dyn MessagePublisher>,
}

impl DoiGenerator {
    pub fn new(
        config: &DoiConfig,
        store: Arc<dyn DoiStore>,
        publisher: Arc<dyn MessagePublisher>,
    ) -> anyhow::Result<Self> {
        if !config.prefix.starts_with("10.") {
            anyhow::bail!("DOI prefix must begin with '10.', got '{}'", config.prefix);
        }

        let portal = Url::parse(&config.portal_url)?;
        if portal.cannot_be_a_base() {
            anyhow::bail!("Portal URL '{}' must be absolute", config.portal_url);
        }

        Ok(Self {
            prefix: config.prefix.to_lowercase(),
            dataset_base: portal.join("dataset/")?,
            download_base: portal.join("occurrence/download/")?,
            store,
            publisher,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether `doi` was issued under this registry's prefix.
    pub fn is_owned(&self, doi: &Doi) -> bool {
        doi.prefix().eq_ignore_ascii_case(&self.prefix)
    }

    pub async fn new_dataset_doi(&self) -> DoiResult<Doi> {
        self.mint(DoiType::Dataset).await
    }

    pub async fn new_download_doi(&self) -> DoiResult<Doi> {
        self.mint(DoiType::Download).await
    }

    async fn mint(&self, kind: DoiType) -> DoiResult<Doi> {
        for attempt in 0..MAX_MINT_ATTEMPTS {
            let doi = Doi::new(&self.prefix, random_suffix(kind.shoulder()))
                .map_err(|e| DbError::config(e.to_string()))?;

            match self.store.create(&doi, kind).await {
                Ok(()) => {
                    if attempt > 100 {
                        tracing::warn!(%doi, attempt, "Searched long for an available {} DOI", kind);
                    }
                    return Ok(doi);
                },
                Err(DbError::Duplicate(_)) => {
                    tracing::debug!(%doi, attempt, "Random {} DOI already exists", kind);
                },
                Err(e) => return Err(e.into()),
            }
        }

        Err(DbError::Duplicate(format!(
            "Tried {} random {} DOIs and none was free",
            MAX_MINT_ATTEMPTS, kind
        ))
        .into())
    }

    /// Landing page of a dataset.
    pub fn dataset_target(&self, dataset_key: Uuid) -> DoiResult<Url> {
        self.dataset_base
            .join(&dataset_key.to_string())
            .map_err(|e| DbError::config(format!("dataset landing page: {}", e)).into())
    }

    /// Landing page of a download.
    pub fn download_target(&self, download_key: &str) -> DoiResult<Url> {
        self.download_base
            .join(download_key)
            .map_err(|e| DbError::config(format!("download landing page: {}", e)).into())
    }

    /// Validate and queue a dataset registration.
    pub async fn register_dataset(
        &self,
        doi: &Doi,
        metadata: &DataCiteMetadata,
        dataset_key: Uuid,
    ) -> DoiResult<()> {
        let target = self.dataset_target(dataset_key)?;
        self.register(doi, metadata, target, &dataset_key.to_string())
            .await
    }

    /// Validate and queue a download registration.
    pub async fn register_download(
        &self,
        doi: &Doi,
        metadata: &DataCiteMetadata,
        download_key: &str,
    ) -> DoiResult<()> {
        let target = self.download_target(download_key)?;
        self.register(doi, metadata, target, download_key).await
    }

    async fn register(
        &self,
        doi: &Doi,
        metadata: &DataCiteMetadata,
        target: Url,
        owner_key: &str,
    ) -> DoiResult<()> {
        let xml = self.validated(doi, metadata).await?;
        self.record_owner(doi, owner_key).await?;
        self.send(ChangeDoiMessage::register(doi.clone(), target, xml))
    }

    async fn record_owner(&self, doi: &Doi, owner_key: &str) -> DoiResult<()> {
        match self.store.set_owner_key(doi, owner_key).await {
            Ok(()) => Ok(()),
            // the processor skips the change as well
            Err(DbError::NotFound(_)) => {
                tracing::debug!(%doi, owner_key, "No local record to attach the owner to");
                Ok(())
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Validate and queue a reservation.
    pub async fn reserve(&self, doi: &Doi, metadata: &DataCiteMetadata) -> DoiResult<()> {
        let xml = self.validated(doi, metadata).await?;
        self.send(ChangeDoiMessage::reserve(doi.clone(), xml))
    }

    /// Queue a deletion.
    pub async fn delete(&self, doi: &Doi) -> DoiResult<()> {
        self.send(ChangeDoiMessage::delete(doi.clone()))
    }

    /// Record a failure without contacting the registration service.
    ///
    /// The cause text replaces the stored document; the landing page is kept.
    pub async fn failed(&self, doi: &Doi, cause: &(dyn std::error::Error + Send + Sync)) -> DoiResult<()> {
        self.write_failed(doi, Some(&failure_report(cause)), cause)
            .await
    }

    /// Like [`Self::failed`], but the last submitted document stays stored
    /// so the DOI can be re-run.
    pub async fn mark_failed(&self, doi: &Doi, cause: &(dyn std::error::Error + Send + Sync)) -> DoiResult<()> {
        self.write_failed(doi, None, cause).await
    }

    async fn write_failed(
        &self,
        doi: &Doi,
        metadata: Option<&str>,
        cause: &(dyn std::error::Error + Send + Sync),
    ) -> DoiResult<()> {
        let target = self
            .store
            .get(doi)
            .await?
            .and_then(|record| record.target);

        self.store
            .update(doi, &DoiData::new(DoiStatus::Failed, target), metadata)
            .await?;

        tracing::warn!(target: ALERT_TARGET, %doi, error = %cause, "DOI marked as failed");
        Ok(())
    }

    async fn validated(&self, doi: &Doi, metadata: &DataCiteMetadata) -> DoiResult<String> {
        match to_xml(doi, metadata) {
            Ok(xml) => Ok(xml),
            Err(err) => {
                if let Err(store_err) = self.failed(doi, &err).await {
                    tracing::error!(%doi, error = %store_err, "Could not record invalid metadata");
                }
                Err(err)
            },
        }
    }

    fn send(&self, message: ChangeDoiMessage) -> DoiResult<()> {
        let doi = message.doi.clone();
        let status = message.status;
        self.publisher
            .publish(message)
            .map_err(|e| DoiError::Queue {
                doi: doi.clone(),
                message: e.to_string(),
            })?;
        tracing::debug!(%doi, %status, "Queued DOI change");
        Ok(())
    }
}

fn random_suffix(shoulder: &str) -> String {
    let mut rng = rand::thread_rng();
    let random: String = (0..RANDOM_LENGTH)
        .map(|_| DOI_CHARACTERS[rng.gen_range(0..DOI_CHARACTERS.len())] as char)
        .collect();
    format!("{}{}", shoulder, random)
}

/// Error text with its source chain, one cause per line.
fn failure_report(err: &(dyn std::error::Error + Send + Sync)) -> String {
    let mut report = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        report.push_str("\nCaused by: ");
        report.push_str(&cause.to_string());
        source = cause.source();
    }
    report
}
