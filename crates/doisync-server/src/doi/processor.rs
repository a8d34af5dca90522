//! Change-notification state machine
//!
//! # Overview
//!
//! [`ChangeNotificationProcessor::handle`] brings one DOI to the status a
//! [`ChangeDoiMessage`] asks for and writes the terminal outcome to the
//! record store. Only terminal outcomes reach the store; intermediate
//! provider failures are logged.
//!
//! | requested    | local record | action                                    |
//! |--------------|--------------|-------------------------------------------|
//! | `REGISTERED` | any          | register with retries and size escalation |
//! | `RESERVED`   | absent/any   | create if absent, reserve with retries    |
//! | `DELETED`    | `RESERVED`   | remote + local delete, if allowed         |
//! | `DELETED`    | other        | soft delete, target kept                  |
//! | `NEW`/`FAILED` | any        | ignored                                   |
//!
//! A `REGISTERED` or `DELETED` message for a DOI without a local record is
//! skipped.
//!
//! Work on one DOI is serialised through a per-DOI lock, so a manual re-run
//! waits for a queued change of the same DOI to reach its terminal outcome.

use super::client::{FailureKind, ProviderError, RegistrationClient};
use super::error::{DoiError, DoiResult};
use super::queue::ChangeDoiMessage;
use super::reducer::EscalationStep;
use super::store::{DoiData, DoiStore, IdentifierRecord};
use crate::config::DoiConfig;
use crate::db::DbError;
use doisync_common::logging::ALERT_TARGET;
use doisync_common::types::{Doi, DoiStatus, DoiType};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

/// Retry and delete policy
#[derive(Debug, Clone)]
pub struct ProcessorSettings {
    /// Total provider calls allowed per message, escalations included
    pub max_attempts: u32,
    pub retry_pause: Duration,
    pub allow_reserved_delete: bool,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self::from(&DoiConfig::default())
    }
}

impl From<&DoiConfig> for ProcessorSettings {
    fn from(config: &DoiConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            retry_pause: config.retry_pause(),
            allow_reserved_delete: config.allow_reserved_delete,
        }
    }
}

/// Terminal outcome of one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Registered,
    Reserved,
    /// Soft delete; the record stays with status DELETED
    Deleted,
    /// Reserved DOI removed remotely and locally
    Removed,
    Failed,
    Skipped,
}

/// One async lock per DOI with work in flight
#[derive(Default)]
struct DoiLocks {
    locks: Mutex<HashMap<Doi, Arc<Mutex<()>>>>,
}

impl DoiLocks {
    async fn acquire(&self, doi: &Doi) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .await
            .entry(doi.clone())
            .or_default()
            .clone()
    }

    /// Drop the entry once no other task holds or waits for it.
    async fn release(&self, doi: &Doi, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        drop(lock);
        if locks.get(doi).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(doi);
        }
    }
}

pub struct ChangeNotificationProcessor {
    client: Arc<dyn RegistrationClient>,
    store: Arc<dyn DoiStore>,
    settings: ProcessorSettings,
    locks: DoiLocks,
}

impl ChangeNotificationProcessor {
    pub fn new(
        client: Arc<dyn RegistrationClient>,
        store: Arc<dyn DoiStore>,
        settings: ProcessorSettings,
    ) -> Self {
        Self {
            client,
            store,
            settings,
            locks: DoiLocks::default(),
        }
    }

    pub fn store(&self) -> &Arc<dyn DoiStore> {
        &self.store
    }

    pub fn client(&self) -> &Arc<dyn RegistrationClient> {
        &self.client
    }

    /// Process one message to its terminal outcome.
    ///
    /// Provider failures end as a FAILED record and `Ok(Outcome::Failed)`.
    /// Only store errors are returned.
    pub async fn handle(&self, message: ChangeDoiMessage) -> DoiResult<Outcome> {
        let doi = message.doi.clone();
        self.exclusive(&doi, self.process(message)).await
    }

    /// Run `work` while holding the lock of `doi`.
    pub async fn exclusive<F: Future>(&self, doi: &Doi, work: F) -> F::Output {
        let lock = self.locks.acquire(doi).await;
        let output = {
            let _guard = lock.lock().await;
            work.await
        };
        self.locks.release(doi, lock).await;
        output
    }

    /// [`Self::handle`] for a caller already holding the lock of the DOI.
    pub(crate) async fn process(&self, message: ChangeDoiMessage) -> DoiResult<Outcome> {
        let doi = message.doi.clone();
        let current = self.store.get(&doi).await?;

        tracing::debug!(
            %doi,
            requested = %message.status,
            current = ?current.as_ref().map(|r| r.status),
            "Processing DOI change"
        );

        let outcome = match message.status {
            DoiStatus::Registered => match current {
                Some(record) => self.register(record, message.target, message.metadata).await?,
                None => skip_unknown(&doi, message.status),
            },
            DoiStatus::Reserved => {
                let record = match current {
                    Some(record) => record,
                    None => {
                        self.store.create(&doi, DoiType::from_doi(&doi)).await?;
                        self.store
                            .get(&doi)
                            .await?
                            .ok_or_else(|| DbError::not_found("DOI", &doi.to_string()))?
                    },
                };
                self.reserve(record, message.metadata).await?
            },
            DoiStatus::Deleted => match current {
                Some(record) => self.delete(record).await?,
                None => skip_unknown(&doi, message.status),
            },
            DoiStatus::New | DoiStatus::Failed => {
                tracing::warn!(%doi, requested = %message.status, "Ignoring DOI change to illegal status");
                Outcome::Skipped
            },
        };

        tracing::info!(%doi, ?outcome, "DOI change processed");
        Ok(outcome)
    }

    async fn register(
        &self,
        record: IdentifierRecord,
        target: Option<Url>,
        document: Option<String>,
    ) -> DoiResult<Outcome> {
        let doi = record.doi.clone();
        let (target, mut document) = match (target, document) {
            (Some(target), Some(document)) => (target, document),
            (_, document) => {
                let err = DoiError::Unrecoverable {
                    doi: doi.clone(),
                    message: "registration needs a target and a document".to_string(),
                };
                return self.fail(&record, document.as_deref(), &err).await;
            },
        };

        let mut step = Some(EscalationStep::FIRST);
        let mut size_rejection: Option<ProviderError> = None;
        let mut last_error: Option<DoiError> = None;

        for attempt in 1..=self.settings.max_attempts {
            let err = match self.client.register(&doi, &target, &document).await {
                Ok(()) => {
                    self.store
                        .update(
                            &doi,
                            &DoiData::new(DoiStatus::Registered, Some(target.clone())),
                            Some(&document),
                        )
                        .await?;
                    return Ok(Outcome::Registered);
                },
                Err(err) => err,
            };

            match err.kind() {
                FailureKind::Transient => {
                    tracing::warn!(%doi, attempt, error = %err, "Transient registration failure");
                    last_error = Some(err.into_doi_error(&doi));
                    if attempt < self.settings.max_attempts {
                        tokio::time::sleep(self.settings.retry_pause).await;
                    }
                },
                FailureKind::SizeRejected => {
                    tracing::warn!(%doi, attempt, ?step, "Registration document rejected as too large");
                    let rejection = size_rejection.get_or_insert(err).clone();
                    let Some(current_step) = step else {
                        return self
                            .fail(&record, Some(&document), &rejection.into_doi_error(&doi))
                            .await;
                    };
                    // a reduced document that is never sent is not stored
                    if attempt == self.settings.max_attempts {
                        last_error = Some(rejection.into_doi_error(&doi));
                        continue;
                    }
                    match current_step.apply(&doi, &document, target.as_str()) {
                        Ok(reduced) => document = reduced,
                        Err(reduce_err) => return self.fail(&record, Some(&document), &reduce_err).await,
                    }
                    step = current_step.next();
                    last_error = Some(rejection.into_doi_error(&doi));
                },
                FailureKind::Unrecoverable => {
                    return self
                        .fail(&record, Some(&document), &err.into_doi_error(&doi))
                        .await;
                },
            }
        }

        let cause = last_error.unwrap_or_else(|| DoiError::Unrecoverable {
            doi: doi.clone(),
            message: "no registration attempt was made".to_string(),
        });
        self.fail(&record, Some(&document), &cause).await
    }

    async fn reserve(&self, record: IdentifierRecord, document: Option<String>) -> DoiResult<Outcome> {
        let doi = record.doi.clone();
        let Some(document) = document else {
            let err = DoiError::Unrecoverable {
                doi: doi.clone(),
                message: "reservation needs a document".to_string(),
            };
            return self.fail(&record, None, &err).await;
        };

        match self
            .with_retries(&doi, "reserve", || self.client.reserve(&doi, &document))
            .await
        {
            Ok(()) => {
                self.store
                    .update(
                        &doi,
                        &DoiData::new(DoiStatus::Reserved, record.target.clone()),
                        Some(&document),
                    )
                    .await?;
                Ok(Outcome::Reserved)
            },
            Err(err) => {
                self.fail(&record, Some(&document), &err.into_doi_error(&doi))
                    .await
            },
        }
    }

    async fn delete(&self, record: IdentifierRecord) -> DoiResult<Outcome> {
        let doi = record.doi.clone();

        if record.status != DoiStatus::Reserved || !self.settings.allow_reserved_delete {
            if record.status == DoiStatus::Reserved {
                tracing::info!(%doi, "Reserved DOI soft-deleted; remote delete is disabled");
            }
            self.store
                .update(&doi, &DoiData::new(DoiStatus::Deleted, record.target.clone()), None)
                .await?;
            return Ok(Outcome::Deleted);
        }

        let remote = self
            .with_retries(&doi, "resolve", || self.client.resolve(&doi))
            .await;
        let removed = match remote {
            Ok(Some(_)) => {
                self.with_retries(&doi, "delete", || self.client.delete(&doi))
                    .await
            },
            Ok(None) => Ok(()),
            Err(err) => Err(err),
        };

        match removed {
            Ok(()) => {
                self.store.delete(&doi).await?;
                Ok(Outcome::Removed)
            },
            Err(err) => self.fail(&record, None, &err.into_doi_error(&doi)).await,
        }
    }

    /// Run `call` until it succeeds, fails non-transiently or the budget runs out.
    async fn with_retries<T, F, Fut>(&self, doi: &Doi, operation: &str, mut call: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if err.kind() == FailureKind::Transient && attempt < self.settings.max_attempts => {
                    tracing::warn!(%doi, attempt, operation, error = %err, "Transient provider failure");
                    tokio::time::sleep(self.settings.retry_pause).await;
                    attempt += 1;
                },
                Err(err) => return Err(err),
            }
        }
    }

    /// Write FAILED, keeping the prior target and the last document.
    async fn fail(
        &self,
        record: &IdentifierRecord,
        document: Option<&str>,
        cause: &DoiError,
    ) -> DoiResult<Outcome> {
        self.store
            .update(
                &record.doi,
                &DoiData::new(DoiStatus::Failed, record.target.clone()),
                document,
            )
            .await?;
        tracing::error!(target: ALERT_TARGET, doi = %record.doi, error = %cause, "DOI change failed");
        Ok(Outcome::Failed)
    }
}

fn skip_unknown(doi: &Doi, requested: DoiStatus) -> Outcome {
    tracing::warn!(%doi, %requested, "No local record for DOI, change skipped");
    Outcome::Skipped
}
