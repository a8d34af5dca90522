//! Schema checks and XML conversion for registration documents

use super::model::{DataCiteMetadata, Identifier};
use crate::doi::error::{DoiError, DoiResult};
use doisync_common::types::Doi;

/// Check the mandatory kernel properties.
///
/// Returns the first problem found.
pub fn validate(metadata: &DataCiteMetadata) -> Result<(), String> {
    match metadata.identifier {
        Some(ref id) if id.identifier_type == "DOI" && !id.value.trim().is_empty() => {},
        Some(ref id) => {
            return Err(format!(
                "identifier must be a non-empty DOI, got {} '{}'",
                id.identifier_type, id.value
            ))
        },
        None => return Err("identifier is missing".to_string()),
    }

    if metadata.creators.creator.is_empty() {
        return Err("at least one creator is required".to_string());
    }
    if metadata
        .creators
        .creator
        .iter()
        .any(|c| c.creator_name.value.trim().is_empty())
    {
        return Err("creator name must not be empty".to_string());
    }

    if !metadata.titles.title.iter().any(|t| !t.trim().is_empty()) {
        return Err("at least one title is required".to_string());
    }

    if metadata.publisher.as_deref().map_or(true, |p| p.trim().is_empty()) {
        return Err("publisher is required".to_string());
    }

    match metadata.publication_year.as_deref() {
        Some(year) if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) => {},
        Some(year) => return Err(format!("publicationYear must be four digits, got '{}'", year)),
        None => return Err("publicationYear is required".to_string()),
    }

    if metadata
        .resource_type
        .as_ref()
        .map_or(true, |rt| rt.resource_type_general.trim().is_empty())
    {
        return Err("resourceType with resourceTypeGeneral is required".to_string());
    }

    if metadata.relations().iter().any(|r| r.value.trim().is_empty()) {
        return Err("related identifier values must not be empty".to_string());
    }

    Ok(())
}

/// Stamp `doi` as the identifier, validate and serialize.
pub fn to_xml(doi: &Doi, metadata: &DataCiteMetadata) -> DoiResult<String> {
    let mut stamped = metadata.clone();
    stamped.identifier = Some(Identifier {
        identifier_type: "DOI".to_string(),
        value: doi.doi_name().to_uppercase(),
    });

    validate(&stamped).map_err(|message| DoiError::invalid_metadata(doi, message))?;

    quick_xml::se::to_string(&stamped)
        .map_err(|e| DoiError::invalid_metadata(doi, format!("failed to serialize: {}", e)))
}

/// Parse a stored or remote document.
pub fn from_xml(doi: &Doi, xml: &str) -> DoiResult<DataCiteMetadata> {
    quick_xml::de::from_str(xml)
        .map_err(|e| DoiError::invalid_metadata(doi, format!("failed to parse document: {}", e)))
}
