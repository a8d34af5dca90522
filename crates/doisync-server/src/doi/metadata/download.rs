//! Occurrence download registration document

use super::format_date;
use super::model::*;
use crate::models::{DatasetUsage, Download, License, User};
use chrono::Datelike;

pub const DOWNLOAD_TITLE: &str = "GBIF Occurrence Download";
pub const PUBLISHER: &str = "The Global Biodiversity Information Facility";
pub const LICENSE_INFO: &str = "Data from some individual datasets included in this download may be licensed under less restrictive terms.";
/// Marker ending the aggregate line; the constituent list follows it.
pub const CONSTITUENTS_MARKER: &str = "constituent datasets:";

const DEFAULT_LICENSE: License = License::CcByNc4_0;
const UNRENDERED_QUERY: &str = "(Query can be viewed on the landing page)";

/// Build the document for a finished download.
///
/// `usages` must be the complete list of constituent datasets. `api_root`
/// is forced to https and given a trailing slash.
pub fn build_download_metadata(
    download: &Download,
    user: &User,
    usages: &[DatasetUsage],
    api_root: &str,
) -> DataCiteMetadata {
    let api_root = clean_api_root(api_root);
    let creator_name = if user.name.trim().is_empty() {
        user.user_name.clone()
    } else {
        user.name.clone()
    };

    let license = download
        .license
        .filter(|l| l.is_concrete())
        .unwrap_or(DEFAULT_LICENSE);

    let mut metadata = DataCiteMetadata {
        identifier: download.doi.as_ref().map(|doi| Identifier {
            identifier_type: "DOI".to_string(),
            value: doi.doi_name().to_uppercase(),
        }),
        creators: Creators {
            creator: vec![Creator::named(creator_name)],
        },
        titles: Titles {
            title: vec![DOWNLOAD_TITLE.to_string()],
        },
        publisher: Some(PUBLISHER.to_string()),
        publication_year: Some(download.created.year().to_string()),
        resource_type: Some(ResourceType {
            resource_type_general: "Dataset".to_string(),
            value: String::new(),
        }),
        subjects: Some(Subjects {
            subject: ["GBIF", "biodiversity", "species occurrences"]
                .iter()
                .map(|s| Subject {
                    scheme: None,
                    value: s.to_string(),
                })
                .collect(),
        }),
        dates: Some(Dates {
            date: vec![
                DateEntry {
                    date_type: DateType::Created,
                    value: format_date(&download.created),
                },
                DateEntry {
                    date_type: DateType::Updated,
                    value: format_date(&download.modified),
                },
            ],
        }),
        alternate_identifiers: Some(AlternateIdentifiers {
            alternate_identifier: vec![AlternateIdentifier {
                identifier_type: "GBIF".to_string(),
                value: download.key.clone(),
            }],
        }),
        sizes: Some(Sizes {
            size: vec![download.size.to_string()],
        }),
        formats: Some(Formats {
            format: download
                .request
                .format
                .media_formats()
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }),
        rights_list: Some(RightsList {
            rights: vec![Rights {
                rights_uri: license.url().map(String::from),
                value: license.title().to_string(),
            }],
        }),
        descriptions: Some(Descriptions {
            description: vec![Description::abstract_text(description(download, usages))],
        }),
        ..Default::default()
    };

    for usage in usages {
        if let Some(ref doi) = usage.dataset_doi {
            metadata.add_relation(RelatedIdentifier::doi(
                RelationType::References,
                doi.doi_name(),
            ));
        }
    }

    metadata.add_relation(RelatedIdentifier::url(
        RelationType::HasMetadata,
        format!("{}occurrence/download/{}", api_root, download.key),
    ));
    metadata.add_relation(RelatedIdentifier::url(
        RelationType::HasMetadata,
        format!("{}occurrence/download/{}/datasets", api_root, download.key),
    ));

    metadata
}

fn description(download: &Download, usages: &[DatasetUsage]) -> String {
    let mut text = format!(
        "A dataset containing {} species occurrences available in GBIF matching the query:\n{}\n\n",
        download.total_records,
        download.request.query.as_deref().unwrap_or(UNRENDERED_QUERY)
    );
    text.push_str(&format!(
        "The dataset includes {} records from {} {}",
        download.total_records, download.number_datasets, CONSTITUENTS_MARKER
    ));

    if !usages.is_empty() {
        for usage in usages {
            text.push_str(&format!(
                "\n {} records from {}.",
                usage.number_records, usage.dataset_title
            ));
        }
        text.push('\n');
        text.push_str(LICENSE_INFO);
    }

    text
}

fn clean_api_root(api_root: &str) -> String {
    let mut root = api_root.replacen("http:", "https:", 1);
    if !root.ends_with('/') {
        root.push('/');
    }
    root
}
