//! DataCite kernel-4 resource document
//!
//! Only the properties the registry writes are modelled. Unknown elements in
//! documents read back from the provider are ignored when parsing.

use serde::{Deserialize, Serialize};

pub const DATACITE_NAMESPACE: &str = "http://datacite.org/schema/kernel-4";

fn default_namespace() -> String {
    DATACITE_NAMESPACE.to_string()
}

/// Root `<resource>` element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "resource")]
pub struct DataCiteMetadata {
    #[serde(rename = "@xmlns", default = "default_namespace")]
    pub xmlns: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub identifier: Option<Identifier>,

    #[serde(default)]
    pub creators: Creators,

    #[serde(default)]
    pub titles: Titles,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub publisher: Option<String>,

    #[serde(rename = "publicationYear", skip_serializing_if = "Option::is_none", default)]
    pub publication_year: Option<String>,

    #[serde(rename = "resourceType", skip_serializing_if = "Option::is_none", default)]
    pub resource_type: Option<ResourceType>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subjects: Option<Subjects>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dates: Option<Dates>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub language: Option<String>,

    #[serde(
        rename = "alternateIdentifiers",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub alternate_identifiers: Option<AlternateIdentifiers>,

    #[serde(
        rename = "relatedIdentifiers",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub related_identifiers: Option<RelatedIdentifiers>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sizes: Option<Sizes>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub formats: Option<Formats>,

    #[serde(rename = "rightsList", skip_serializing_if = "Option::is_none", default)]
    pub rights_list: Option<RightsList>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub descriptions: Option<Descriptions>,
}

impl Default for DataCiteMetadata {
    fn default() -> Self {
        Self {
            xmlns: default_namespace(),
            identifier: None,
            creators: Creators::default(),
            titles: Titles::default(),
            publisher: None,
            publication_year: None,
            resource_type: None,
            subjects: None,
            dates: None,
            language: None,
            alternate_identifiers: None,
            related_identifiers: None,
            sizes: None,
            formats: None,
            rights_list: None,
            descriptions: None,
        }
    }
}

impl DataCiteMetadata {
    /// Related identifiers, empty when the block is absent.
    pub fn relations(&self) -> &[RelatedIdentifier] {
        self.related_identifiers
            .as_ref()
            .map(|r| r.related_identifier.as_slice())
            .unwrap_or_default()
    }

    /// Append a related identifier, creating the block if needed.
    pub fn add_relation(&mut self, relation: RelatedIdentifier) {
        self.related_identifiers
            .get_or_insert_with(RelatedIdentifiers::default)
            .related_identifier
            .push(relation);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(rename = "@identifierType")]
    pub identifier_type: String,
    #[serde(rename = "$text")]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Creators {
    #[serde(rename = "creator", default)]
    pub creator: Vec<Creator>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creator {
    #[serde(rename = "creatorName")]
    pub creator_name: CreatorName,
    #[serde(rename = "nameIdentifier", skip_serializing_if = "Option::is_none", default)]
    pub name_identifier: Option<NameIdentifier>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub affiliation: Option<String>,
}

impl Creator {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            creator_name: CreatorName {
                name_type: None,
                value: name.into(),
            },
            name_identifier: None,
            affiliation: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatorName {
    #[serde(rename = "@nameType", skip_serializing_if = "Option::is_none", default)]
    pub name_type: Option<String>,
    #[serde(rename = "$text", default)]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameIdentifier {
    #[serde(rename = "@nameIdentifierScheme")]
    pub scheme: String,
    #[serde(rename = "@schemeURI", skip_serializing_if = "Option::is_none", default)]
    pub scheme_uri: Option<String>,
    #[serde(rename = "$text")]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Titles {
    #[serde(rename = "title", default)]
    pub title: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceType {
    #[serde(rename = "@resourceTypeGeneral")]
    pub resource_type_general: String,
    #[serde(rename = "$text", default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subjects {
    #[serde(rename = "subject", default)]
    pub subject: Vec<Subject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(rename = "@subjectScheme", skip_serializing_if = "Option::is_none", default)]
    pub scheme: Option<String>,
    #[serde(rename = "$text")]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dates {
    #[serde(rename = "date", default)]
    pub date: Vec<DateEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateType {
    Created,
    Updated,
    Issued,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateEntry {
    #[serde(rename = "@dateType")]
    pub date_type: DateType,
    #[serde(rename = "$text")]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlternateIdentifiers {
    #[serde(rename = "alternateIdentifier", default)]
    pub alternate_identifier: Vec<AlternateIdentifier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternateIdentifier {
    #[serde(rename = "@alternateIdentifierType")]
    pub identifier_type: String,
    #[serde(rename = "$text")]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelatedIdentifiers {
    #[serde(rename = "relatedIdentifier", default)]
    pub related_identifier: Vec<RelatedIdentifier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelatedIdentifierType {
    #[serde(rename = "DOI")]
    Doi,
    #[serde(rename = "URL")]
    Url,
}

/// DataCite relation types used by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationType {
    IsPreviousVersionOf,
    IsNewVersionOf,
    References,
    IsDerivedFrom,
    HasMetadata,
}

impl RelationType {
    /// Relations that point at a different version of the same resource.
    pub fn is_version(self) -> bool {
        matches!(self, Self::IsPreviousVersionOf | Self::IsNewVersionOf)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedIdentifier {
    #[serde(rename = "@relatedIdentifierType")]
    pub identifier_type: RelatedIdentifierType,
    #[serde(rename = "@relationType")]
    pub relation_type: RelationType,
    #[serde(rename = "$text")]
    pub value: String,
}

impl RelatedIdentifier {
    pub fn doi(relation_type: RelationType, doi_name: impl Into<String>) -> Self {
        Self {
            identifier_type: RelatedIdentifierType::Doi,
            relation_type,
            value: doi_name.into(),
        }
    }

    pub fn url(relation_type: RelationType, url: impl Into<String>) -> Self {
        Self {
            identifier_type: RelatedIdentifierType::Url,
            relation_type,
            value: url.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sizes {
    #[serde(rename = "size", default)]
    pub size: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Formats {
    #[serde(rename = "format", default)]
    pub format: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RightsList {
    #[serde(rename = "rights", default)]
    pub rights: Vec<Rights>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rights {
    #[serde(rename = "@rightsURI", skip_serializing_if = "Option::is_none", default)]
    pub rights_uri: Option<String>,
    #[serde(rename = "$text")]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Descriptions {
    #[serde(rename = "description", default)]
    pub description: Vec<Description>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DescriptionType {
    Abstract,
    Methods,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Description {
    #[serde(rename = "@descriptionType")]
    pub description_type: DescriptionType,
    #[serde(rename = "$text", default)]
    pub value: String,
}

impl Description {
    pub fn abstract_text(value: impl Into<String>) -> Self {
        Self {
            description_type: DescriptionType::Abstract,
            value: value.into(),
        }
    }
}
