//! Registration documents
//!
//! # Overview
//!
//! - [`model`] - serde model of the DataCite kernel-4 `resource` document
//! - [`validator`] - mandatory property checks, `to_xml` / `from_xml`
//! - [`dataset`] / [`download`] - builders turning registry entities into
//!   documents
//!
//! Builders are pure: they never touch the network or the record store.

pub mod dataset;
pub mod download;
pub mod model;
pub mod validator;

pub use dataset::build_dataset_metadata;
pub use download::build_download_metadata;
pub use model::DataCiteMetadata;
pub use validator::{from_xml, to_xml, validate};

use doisync_common::types::Doi;
use model::{RelatedIdentifier, RelationType};

/// Kind of link between two versions of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionKind {
    IsPreviousVersionOf,
    IsNewVersionOf,
}

/// Version link embedded in a built document; `from` is the document's own DOI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRelation {
    pub from: Doi,
    pub to: Doi,
    pub kind: VersionKind,
}

impl VersionRelation {
    pub fn previous_version_of(from: Doi, to: Doi) -> Self {
        Self {
            from,
            to,
            kind: VersionKind::IsPreviousVersionOf,
        }
    }

    pub fn new_version_of(from: Doi, to: Doi) -> Self {
        Self {
            from,
            to,
            kind: VersionKind::IsNewVersionOf,
        }
    }

    pub fn to_related_identifier(&self) -> RelatedIdentifier {
        let relation_type = match self.kind {
            VersionKind::IsPreviousVersionOf => RelationType::IsPreviousVersionOf,
            VersionKind::IsNewVersionOf => RelationType::IsNewVersionOf,
        };
        RelatedIdentifier::doi(relation_type, self.to.doi_name())
    }
}

pub(crate) fn format_date(date: &chrono::DateTime<chrono::Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}
