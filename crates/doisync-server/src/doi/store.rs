//! Local identifier record store
//!
//! The store is the local view of truth about every DOI the registry has
//! minted. [`crate::db::PgDoiStore`] is the production implementation;
//! [`InMemoryDoiStore`] backs tests and single-process tooling.

use crate::db::{DbError, DbResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use doisync_common::types::{Doi, DoiStatus, DoiType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use url::Url;

/// Status and landing page written together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoiData {
    pub status: DoiStatus,
    pub target: Option<Url>,
}

impl DoiData {
    pub fn new(status: DoiStatus, target: Option<Url>) -> Self {
        Self { status, target }
    }
}

/// Stored state of one DOI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifierRecord {
    pub doi: Doi,
    #[serde(rename = "type")]
    pub kind: DoiType,
    /// Key of the dataset or download, known once a registration is queued
    pub owner_key: Option<String>,
    pub status: DoiStatus,
    pub target: Option<Url>,
    /// Last submitted document, or the failure cause for FAILED records
    pub metadata: Option<String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl IdentifierRecord {
    pub fn data(&self) -> DoiData {
        DoiData::new(self.status, self.target.clone())
    }
}

#[async_trait]
pub trait DoiStore: Send + Sync {
    /// Insert a NEW record. Fails with [`DbError::Duplicate`] if the DOI exists.
    async fn create(&self, doi: &Doi, kind: DoiType) -> DbResult<()>;

    async fn get(&self, doi: &Doi) -> DbResult<Option<IdentifierRecord>>;

    /// Write status and target. `None` keeps the stored document.
    async fn update(&self, doi: &Doi, data: &DoiData, metadata: Option<&str>) -> DbResult<()>;

    /// Record which dataset or download owns the DOI.
    async fn set_owner_key(&self, doi: &Doi, owner_key: &str) -> DbResult<()>;

    /// Physically remove a record.
    async fn delete(&self, doi: &Doi) -> DbResult<()>;

    async fn list(&self, status: DoiStatus) -> DbResult<Vec<IdentifierRecord>>;

    /// Liveness check of the backing store.
    async fn ping(&self) -> DbResult<()> {
        Ok(())
    }
}

/// Map-backed store that counts mutating calls
#[derive(Default)]
pub struct InMemoryDoiStore {
    records: Mutex<HashMap<Doi, IdentifierRecord>>,
    writes: AtomicUsize,
}

impl InMemoryDoiStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of create, update and delete calls that changed state.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Insert a record as-is, bypassing the write counter.
    pub async fn insert(&self, record: IdentifierRecord) {
        self.records.lock().await.insert(record.doi.clone(), record);
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl DoiStore for InMemoryDoiStore {
    async fn create(&self, doi: &Doi, kind: DoiType) -> DbResult<()> {
        let mut records = self.records.lock().await;
        if records.contains_key(doi) {
            return Err(DbError::duplicate("DOI", &doi.to_string()));
        }
        let now = Utc::now();
        records.insert(
            doi.clone(),
            IdentifierRecord {
                doi: doi.clone(),
                kind,
                owner_key: None,
                status: DoiStatus::New,
                target: None,
                metadata: None,
                created: now,
                modified: now,
            },
        );
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get(&self, doi: &Doi) -> DbResult<Option<IdentifierRecord>> {
        Ok(self.records.lock().await.get(doi).cloned())
    }

    async fn update(&self, doi: &Doi, data: &DoiData, metadata: Option<&str>) -> DbResult<()> {
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(doi)
            .ok_or_else(|| DbError::not_found("DOI", &doi.to_string()))?;
        record.status = data.status;
        record.target = data.target.clone();
        if let Some(metadata) = metadata {
            record.metadata = Some(metadata.to_string());
        }
        record.modified = Utc::now();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn set_owner_key(&self, doi: &Doi, owner_key: &str) -> DbResult<()> {
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(doi)
            .ok_or_else(|| DbError::not_found("DOI", &doi.to_string()))?;
        record.owner_key = Some(owner_key.to_string());
        record.modified = Utc::now();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, doi: &Doi) -> DbResult<()> {
        if self.records.lock().await.remove(doi).is_none() {
            return Err(DbError::not_found("DOI", &doi.to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list(&self, status: DoiStatus) -> DbResult<Vec<IdentifierRecord>> {
        let mut records: Vec<_> = self
            .records
            .lock()
            .await
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.doi.cmp(&b.doi));
        Ok(records)
    }
}
