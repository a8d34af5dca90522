//! Operator diagnostics and manual re-runs
//!
//! A FAILED record needs an operator. [`DoiSynchronizer`] compares the local
//! record with the registration service and re-submits the stored document.

use super::client::RemoteDoi;
use super::error::{DoiError, DoiResult};
use super::metadata::from_xml;
use super::processor::{ChangeNotificationProcessor, Outcome};
use super::queue::ChangeDoiMessage;
use super::store::IdentifierRecord;
use crate::db::DbError;
use doisync_common::types::{Doi, DoiStatus};
use serde::Serialize;
use std::sync::Arc;

/// Local and remote view of one DOI
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub doi: Doi,
    pub record: Option<IdentifierRecord>,
    pub remote: Option<RemoteDoi>,
    /// `None` unless both sides have a target
    pub target_matches: Option<bool>,
    /// `None` unless both sides have a document
    pub metadata_matches: Option<bool>,
}

impl Diagnostics {
    pub fn exists_remotely(&self) -> bool {
        self.remote.is_some()
    }

    /// Local and remote agree on status, target and document.
    pub fn in_sync(&self) -> bool {
        let (Some(record), Some(remote)) = (&self.record, &self.remote) else {
            return false;
        };
        record.status == remote.status
            && self.target_matches.unwrap_or(true)
            && self.metadata_matches.unwrap_or(true)
    }
}

pub struct DoiSynchronizer {
    processor: Arc<ChangeNotificationProcessor>,
}

impl DoiSynchronizer {
    pub fn new(processor: Arc<ChangeNotificationProcessor>) -> Self {
        Self { processor }
    }

    pub async fn diagnose(&self, doi: &Doi) -> DoiResult<Diagnostics> {
        let record = self.processor.store().get(doi).await?;
        let client = self.processor.client();

        let remote = client
            .resolve(doi)
            .await
            .map_err(|e| e.into_doi_error(doi))?;

        let target_matches = match (&record, &remote) {
            (Some(record), Some(remote)) => match (&record.target, &remote.target) {
                (Some(local), Some(remote)) => Some(local == remote),
                _ => None,
            },
            _ => None,
        };

        let local_document = record.as_ref().and_then(|r| r.metadata.as_deref());
        let metadata_matches = match (local_document, remote.is_some()) {
            (Some(local), true) => {
                let remote_document = client
                    .metadata(doi)
                    .await
                    .map_err(|e| e.into_doi_error(doi))?;
                remote_document.map(|remote| same_document(doi, local, &remote))
            },
            _ => None,
        };

        Ok(Diagnostics {
            doi: doi.clone(),
            record,
            remote,
            target_matches,
            metadata_matches,
        })
    }

    pub async fn list_failed(&self) -> DoiResult<Vec<IdentifierRecord>> {
        Ok(self.processor.store().list(DoiStatus::Failed).await?)
    }

    /// Stored document of `doi`, if any.
    pub async fn export(&self, doi: &Doi) -> DoiResult<Option<String>> {
        Ok(self.record(doi).await?.metadata)
    }

    /// Register the stored document again and wait for the outcome.
    ///
    /// Holds the DOI lock from reading the record to the terminal write, so
    /// a change the workers are processing for the same DOI finishes first.
    pub async fn rerun(&self, doi: &Doi) -> DoiResult<Outcome> {
        self.processor.exclusive(doi, self.rerun_locked(doi)).await
    }

    async fn rerun_locked(&self, doi: &Doi) -> DoiResult<Outcome> {
        let record = self.record(doi).await?;

        let target = record.target.ok_or_else(|| DoiError::Unrecoverable {
            doi: doi.clone(),
            message: "no landing page stored, cannot re-run".to_string(),
        })?;
        let document = record
            .metadata
            .ok_or_else(|| DoiError::invalid_metadata(doi, "no document stored"))?;
        from_xml(doi, &document)?;

        tracing::info!(%doi, %target, "Re-running DOI registration");
        self.processor
            .process(ChangeDoiMessage::register(doi.clone(), target, document))
            .await
    }

    async fn record(&self, doi: &Doi) -> DoiResult<IdentifierRecord> {
        self.processor
            .store()
            .get(doi)
            .await?
            .ok_or_else(|| DbError::not_found("DOI", &doi.to_string()).into())
    }
}

/// Compare as parsed documents so formatting differences do not count.
fn same_document(doi: &Doi, local: &str, remote: &str) -> bool {
    match (from_xml(doi, local), from_xml(doi, remote)) {
        (Ok(local), Ok(remote)) => local == remote,
        _ => false,
    }
}
