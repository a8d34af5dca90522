//! Entity-change hooks
//!
//! # Overview
//!
//! The registry calls [`LifecycleReconciler`] synchronously whenever a dataset
//! or a download is saved. The reconciler decides which DOIs need work,
//! builds their documents and hands them to the [`DoiGenerator`]. It never
//! waits for the registration service and never returns an error: failures
//! are logged and recorded as FAILED.

use super::error::DoiError;
use super::generator::DoiGenerator;
use super::metadata::{build_dataset_metadata, build_download_metadata, VersionRelation};
use super::usages::UsageSource;
use crate::config::DoiConfig;
use crate::models::{Dataset, DatasetUsage, Download, DownloadStatus, User};
use doisync_common::logging::ALERT_TARGET;
use doisync_common::types::Doi;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

pub struct LifecycleReconciler {
    generator: Arc<DoiGenerator>,
    usages: Arc<dyn UsageSource>,
    excluded_parents: HashSet<Uuid>,
    page_size: u32,
    api_root: String,
}

impl LifecycleReconciler {
    pub fn new(generator: Arc<DoiGenerator>, usages: Arc<dyn UsageSource>, config: &DoiConfig) -> Self {
        Self {
            generator,
            usages,
            excluded_parents: config.dataset_parent_exclude_list.clone(),
            page_size: config.usages_page_size.max(1),
            api_root: config.api_root.clone(),
        }
    }

    pub fn generator(&self) -> &Arc<DoiGenerator> {
        &self.generator
    }

    /// React to a saved dataset.
    ///
    /// `previous` is the DOI the dataset carried before this save.
    pub async fn dataset_changed(&self, dataset: &Dataset, previous: Option<&Doi>) {
        if let Some(parent) = dataset.parent_dataset_key {
            if self.excluded_parents.contains(&parent) {
                tracing::debug!(dataset = %dataset.key, %parent, "Parent dataset excluded from DOI handling");
                return;
            }
        }

        let current = dataset.doi.as_ref();
        let changed = previous.filter(|p| Some(*p) != current);

        if let (Some(previous), Some(current)) = (changed, current) {
            if self.generator.is_owned(previous) {
                let relation = VersionRelation::previous_version_of(previous.clone(), current.clone());
                self.register_dataset(dataset, previous, Some(&relation)).await;
            }
        }

        if let Some(current) = current.filter(|doi| self.generator.is_owned(doi)) {
            let relation = changed.map(|p| VersionRelation::new_version_of(current.clone(), p.clone()));
            self.register_dataset(dataset, current, relation.as_ref()).await;
        }
    }

    async fn register_dataset(&self, dataset: &Dataset, doi: &Doi, relation: Option<&VersionRelation>) {
        let metadata = build_dataset_metadata(dataset, relation);
        if let Err(err) = self
            .generator
            .register_dataset(doi, &metadata, dataset.key)
            .await
        {
            self.record_failure(doi, err).await;
        }
    }

    /// React to a saved download.
    pub async fn download_changed(&self, download: &Download, previous: Option<&Download>, user: &User) {
        let Some(doi) = download.doi.as_ref() else {
            return;
        };
        if !self.generator.is_owned(doi) {
            tracing::debug!(%doi, download = %download.key, "Download DOI not owned, ignoring");
            return;
        }

        let already_available = previous.is_some_and(|p| {
            matches!(p.status, DownloadStatus::Succeeded | DownloadStatus::FileErased)
        });

        if download.is_available() && !already_available {
            match self.all_usages(&download.key).await {
                Ok(usages) => {
                    let metadata = build_download_metadata(download, user, &usages, &self.api_root);
                    if let Err(err) = self
                        .generator
                        .register_download(doi, &metadata, &download.key)
                        .await
                    {
                        self.record_failure(doi, err).await;
                    }
                },
                Err(err) => self.record_failure(doi, err).await,
            }
        } else if download.status.is_failure() {
            if let Err(err) = self.generator.delete(doi).await {
                tracing::error!(target: ALERT_TARGET, %doi, error = %err, "Failed to delete DOI of failed download");
            }
        }
    }

    async fn all_usages(&self, download_key: &str) -> Result<Vec<DatasetUsage>, DoiError> {
        let mut usages = Vec::new();
        let mut offset = 0u64;
        loop {
            let page = self
                .usages
                .list_usages(download_key, offset, self.page_size)
                .await?;
            let count = page.usages.len();
            usages.extend(page.usages);
            // the source may serve fewer rows than asked for; only its end
            // marker or an empty page ends the listing
            if page.end_of_records || count == 0 {
                break;
            }
            offset += count as u64;
        }
        tracing::debug!(download_key, count = usages.len(), "Collected dataset usages");
        Ok(usages)
    }

    async fn record_failure(&self, doi: &Doi, err: DoiError) {
        tracing::error!(target: ALERT_TARGET, %doi, error = %err, "DOI update failed");
        // the generator records invalid documents itself
        if matches!(err, DoiError::InvalidMetadata { .. }) {
            return;
        }
        if let Err(store_err) = self.generator.mark_failed(doi, &err).await {
            tracing::error!(%doi, error = %store_err, "Could not mark DOI as failed");
        }
    }
}
