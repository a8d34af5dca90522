//! Constituent datasets of a download
//!
//! The reconciler pages through a [`UsageSource`] until the source reports
//! the end of the records or serves an empty page. [`ApiUsageSource`] reads
//! the registry's public occurrence API.

use super::error::{DoiError, DoiResult};
use crate::models::DatasetUsage;
use async_trait::async_trait;
use doisync_common::types::Doi;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// One page of constituent datasets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsagePage {
    pub usages: Vec<DatasetUsage>,
    /// No rows follow this page
    pub end_of_records: bool,
}

#[async_trait]
pub trait UsageSource: Send + Sync {
    /// One page of usages, starting at `offset`.
    ///
    /// `limit` is a request; a source may cap it and serve fewer rows
    /// without the page being the last one.
    async fn list_usages(&self, download_key: &str, offset: u64, limit: u32) -> DoiResult<UsagePage>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUsagePage {
    #[serde(default)]
    results: Vec<ApiUsage>,
    #[serde(default)]
    end_of_records: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(rename = "datasetKey")]
    dataset_key: Uuid,
    #[serde(rename = "datasetTitle", default)]
    dataset_title: String,
    #[serde(rename = "datasetDOI", default)]
    dataset_doi: Option<String>,
    #[serde(rename = "numberRecords", default)]
    number_records: i64,
}

impl From<ApiUsage> for DatasetUsage {
    fn from(usage: ApiUsage) -> Self {
        DatasetUsage {
            dataset_key: usage.dataset_key,
            dataset_title: usage.dataset_title,
            // unparsable DOIs are dropped rather than failing the page
            dataset_doi: usage.dataset_doi.and_then(|d| d.parse::<Doi>().ok()),
            number_records: usage.number_records,
        }
    }
}

/// Reads `occurrence/download/{key}/datasets` from the public API
pub struct ApiUsageSource {
    client: Client,
    api_root: Url,
}

impl ApiUsageSource {
    pub fn new(api_root: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut api_root = Url::parse(api_root)?;
        if !api_root.path().ends_with('/') {
            let path = format!("{}/", api_root.path());
            api_root.set_path(&path);
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, api_root })
    }

    fn failure(download_key: &str, message: impl ToString) -> DoiError {
        DoiError::Usages {
            key: download_key.to_string(),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl UsageSource for ApiUsageSource {
    async fn list_usages(&self, download_key: &str, offset: u64, limit: u32) -> DoiResult<UsagePage> {
        let mut url = self
            .api_root
            .join(&format!("occurrence/download/{}/datasets", download_key))
            .map_err(|e| Self::failure(download_key, e))?;
        url.query_pairs_mut()
            .append_pair("offset", &offset.to_string())
            .append_pair("limit", &limit.to_string());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::failure(download_key, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::failure(download_key, format!("HTTP {}", status)));
        }

        let page: ApiUsagePage = response
            .json()
            .await
            .map_err(|e| Self::failure(download_key, e))?;

        tracing::debug!(download_key, offset, count = page.results.len(), "Fetched dataset usages");
        // without the flag, a short page is taken as the last one
        let end_of_records = page
            .end_of_records
            .unwrap_or(page.results.len() < limit as usize);
        Ok(UsagePage {
            usages: page.results.into_iter().map(DatasetUsage::from).collect(),
            end_of_records,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_usage_conversion() {
        let page: ApiUsagePage = serde_json::from_value(json!({
            "offset": 0,
            "limit": 2,
            "endOfRecords": true,
            "results": [
                {
                    "datasetKey": "7ddf754f-d193-4cc9-b351-99906754a03b",
                    "datasetTitle": "Fungi of Denmark",
                    "datasetDOI": "doi:10.15468/abc",
                    "numberRecords": 12
                },
                {
                    "datasetKey": "4fa7b334-ce0d-4e88-aaae-2e0c138d049e",
                    "datasetTitle": "No DOI",
                    "numberRecords": 3
                }
            ]
        }))
        .unwrap();

        assert_eq!(page.end_of_records, Some(true));
        let usages: Vec<DatasetUsage> = page.results.into_iter().map(DatasetUsage::from).collect();
        assert_eq!(usages.len(), 2);
        assert_eq!(usages[0].dataset_doi.as_ref().unwrap().suffix(), "abc");
        assert_eq!(usages[0].number_records, 12);
        assert!(usages[1].dataset_doi.is_none());
    }
}
