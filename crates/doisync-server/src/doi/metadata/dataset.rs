//! Dataset registration document

use super::model::*;
use super::{format_date, VersionRelation};
use crate::models::{Contact, Dataset};
use chrono::Datelike;
use regex::Regex;
use std::sync::LazyLock;

static ORCID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://orcid\.org/)([\d\-]+[\dX])$")
        .unwrap_or_else(|e| unreachable!("static ORCID pattern must compile: {e}"))
});

const ORCID_SCHEME: &str = "ORCID";

/// Build the document for `dataset`, optionally linking another version.
pub fn build_dataset_metadata(
    dataset: &Dataset,
    relation: Option<&VersionRelation>,
) -> DataCiteMetadata {
    let mut metadata = DataCiteMetadata {
        identifier: dataset.doi.as_ref().map(|doi| Identifier {
            identifier_type: "DOI".to_string(),
            value: doi.doi_name().to_uppercase(),
        }),
        creators: Creators {
            creator: creators(dataset),
        },
        titles: Titles {
            title: vec![dataset.title.clone()],
        },
        publisher: Some(dataset.publishing_organization.title.clone()),
        publication_year: Some(
            dataset
                .pub_date
                .unwrap_or(dataset.created)
                .year()
                .to_string(),
        ),
        resource_type: Some(ResourceType {
            resource_type_general: "Dataset".to_string(),
            value: String::new(),
        }),
        dates: Some(Dates {
            date: vec![
                DateEntry {
                    date_type: DateType::Created,
                    value: format_date(&dataset.created),
                },
                DateEntry {
                    date_type: DateType::Updated,
                    value: format_date(&dataset.modified),
                },
            ],
        }),
        language: dataset.language.clone(),
        alternate_identifiers: Some(AlternateIdentifiers {
            alternate_identifier: vec![AlternateIdentifier {
                identifier_type: "UUID".to_string(),
                value: dataset.key.to_string(),
            }],
        }),
        ..Default::default()
    };

    if let Some(description) = dataset
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
    {
        metadata.descriptions = Some(Descriptions {
            description: vec![Description::abstract_text(description)],
        });
    }

    if let Some(license) = dataset.license.filter(|l| l.is_concrete()) {
        metadata.rights_list = Some(RightsList {
            rights: vec![Rights {
                rights_uri: license.url().map(String::from),
                value: license.title().to_string(),
            }],
        });
    }

    let subjects: Vec<Subject> = dataset
        .keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .map(|k| Subject {
            scheme: None,
            value: k.clone(),
        })
        .collect();
    if !subjects.is_empty() {
        metadata.subjects = Some(Subjects { subject: subjects });
    }

    if let Some(relation) = relation {
        metadata.add_relation(relation.to_related_identifier());
    }

    metadata
}

fn creators(dataset: &Dataset) -> Vec<Creator> {
    let creators: Vec<Creator> = dataset
        .contacts
        .iter()
        .filter(|c| c.is_creator())
        .filter_map(to_creator)
        .collect();

    if creators.is_empty() {
        // creator is mandatory
        vec![Creator::named(dataset.publishing_organization.title.clone())]
    } else {
        creators
    }
}

fn to_creator(contact: &Contact) -> Option<Creator> {
    let name = contact.display_name()?;
    let mut creator = Creator::named(name);
    creator.affiliation = contact
        .organization
        .clone()
        .filter(|o| !o.trim().is_empty());
    creator.name_identifier = contact.user_id.as_deref().and_then(orcid);
    Some(creator)
}

fn orcid(user_id: &str) -> Option<NameIdentifier> {
    let caps = ORCID_RE.captures(user_id.trim())?;
    Some(NameIdentifier {
        scheme: ORCID_SCHEME.to_string(),
        scheme_uri: Some(caps[1].to_string()),
        value: caps[2].to_string(),
    })
}
