//! Registry entities seen by the identifier engine
//!
//! Datasets and downloads are owned by the wider registry; these are the
//! fields the engine reads when building registration documents.

use chrono::{DateTime, Utc};
use doisync_common::types::Doi;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publishing organization of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub key: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactType {
    Originator,
    MetadataAuthor,
    AdministrativePointOfContact,
    PointOfContact,
    Publisher,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub contact_type: ContactType,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub organization: Option<String>,
    /// Personal identifier, typically an ORCID URL
    pub user_id: Option<String>,
}

impl Contact {
    /// "Last, First" style display name, `None` when both parts are empty.
    pub fn display_name(&self) -> Option<String> {
        let first = self.first_name.as_deref().map(str::trim).unwrap_or("");
        let last = self.last_name.as_deref().map(str::trim).unwrap_or("");
        match (first.is_empty(), last.is_empty()) {
            (true, true) => None,
            (false, true) => Some(first.to_string()),
            (true, false) => Some(last.to_string()),
            (false, false) => Some(format!("{}, {}", last, first)),
        }
    }

    /// Contacts credited as creators of the resource.
    pub fn is_creator(&self) -> bool {
        matches!(
            self.contact_type,
            ContactType::Originator | ContactType::MetadataAuthor
        )
    }
}

/// Licenses the registry accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum License {
    #[serde(rename = "CC0_1_0")]
    Cc0_1_0,
    #[serde(rename = "CC_BY_4_0")]
    CcBy4_0,
    #[serde(rename = "CC_BY_NC_4_0")]
    CcByNc4_0,
    #[serde(rename = "UNSPECIFIED")]
    Unspecified,
}

impl License {
    /// Concrete licenses have a title and a URL.
    pub fn is_concrete(self) -> bool {
        !matches!(self, License::Unspecified)
    }

    pub fn title(self) -> &'static str {
        match self {
            License::Cc0_1_0 => "Public Domain (CC0 1.0)",
            License::CcBy4_0 => "Creative Commons Attribution (CC-BY) 4.0",
            License::CcByNc4_0 => "Creative Commons Attribution Non Commercial (CC-BY-NC) 4.0",
            License::Unspecified => "Unspecified",
        }
    }

    pub fn url(self) -> Option<&'static str> {
        match self {
            License::Cc0_1_0 => Some("http://creativecommons.org/publicdomain/zero/1.0/legalcode"),
            License::CcBy4_0 => Some("http://creativecommons.org/licenses/by/4.0/legalcode"),
            License::CcByNc4_0 => Some("http://creativecommons.org/licenses/by-nc/4.0/legalcode"),
            License::Unspecified => None,
        }
    }
}

/// A registered dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub key: Uuid,
    pub parent_dataset_key: Option<Uuid>,
    pub doi: Option<Doi>,
    pub title: String,
    pub description: Option<String>,
    pub publishing_organization: Organization,
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub license: Option<License>,
    /// ISO 639 language code of the data
    pub language: Option<String>,
    pub created_by: String,
    pub pub_date: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Lifecycle of an occurrence download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DownloadStatus {
    Preparing,
    Running,
    Succeeded,
    Cancelled,
    Killed,
    Failed,
    Suspended,
    /// Succeeded earlier; the file has since been archived away
    FileErased,
}

impl DownloadStatus {
    /// Terminal failure states whose identifier is withdrawn.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            DownloadStatus::Killed | DownloadStatus::Cancelled | DownloadStatus::Failed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DownloadFormat {
    Dwca,
    SimpleCsv,
    SpeciesList,
    SimpleParquet,
}

impl DownloadFormat {
    /// Media format names advertised in the registration document.
    pub fn media_formats(self) -> &'static [&'static str] {
        match self {
            DownloadFormat::Dwca => &["Darwin Core Archive", "TSV", "ZIP"],
            DownloadFormat::SimpleCsv | DownloadFormat::SpeciesList => &["TSV", "ZIP"],
            DownloadFormat::SimpleParquet => &["Parquet", "ZIP"],
        }
    }
}

/// Request that produced a download
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub creator: String,
    pub format: DownloadFormat,
    /// Human readable filter, if the request could be rendered
    pub query: Option<String>,
}

/// An occurrence download
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Download {
    pub key: String,
    pub doi: Option<Doi>,
    pub status: DownloadStatus,
    pub request: DownloadRequest,
    pub license: Option<License>,
    pub total_records: i64,
    pub number_datasets: i64,
    /// Archive size in bytes
    pub size: i64,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Download {
    pub fn is_available(&self) -> bool {
        self.status == DownloadStatus::Succeeded
    }
}

/// Registry user who requested a download
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_name: String,
    pub name: String,
}

/// One constituent dataset of a download
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetUsage {
    pub dataset_key: Uuid,
    pub dataset_title: String,
    pub dataset_doi: Option<Doi>,
    pub number_records: i64,
}
