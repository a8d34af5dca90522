//! Escalating reductions for documents the provider rejects as too large
//!
//! Download documents list every constituent dataset, both in the abstract
//! and as related identifiers, and can exceed the provider's payload limit.
//! Each [`EscalationStep`] removes more of that list. Steps are idempotent
//! and the output of every step is re-validated.

use super::error::DoiResult;
use super::metadata::download::CONSTITUENTS_MARKER;
use super::metadata::model::{DataCiteMetadata, RelationType};
use super::metadata::{from_xml, to_xml};
use doisync_common::types::Doi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationStep {
    /// Replace the constituent list in the abstract with a pointer sentence
    TruncateDescription,
    /// Also drop the per-constituent related identifiers
    TruncateConstituents,
}

impl EscalationStep {
    pub const FIRST: EscalationStep = EscalationStep::TruncateDescription;

    pub fn next(self) -> Option<EscalationStep> {
        match self {
            EscalationStep::TruncateDescription => Some(EscalationStep::TruncateConstituents),
            EscalationStep::TruncateConstituents => None,
        }
    }

    /// Apply this step to a serialized document.
    pub fn apply(self, doi: &Doi, xml: &str, target: &str) -> DoiResult<String> {
        let mut metadata = from_xml(doi, xml)?;
        self.reduce(&mut metadata, target);
        to_xml(doi, &metadata)
    }

    /// Apply this step in place.
    pub fn reduce(self, metadata: &mut DataCiteMetadata, target: &str) {
        truncate_description(metadata, target);
        if self == EscalationStep::TruncateConstituents {
            truncate_constituents(metadata);
        }
    }
}

fn pointer_sentence(target: &str) -> String {
    format!(
        "{}\nPlease see {} for full list of all constituents.",
        CONSTITUENTS_MARKER, target
    )
}

fn truncate_description(metadata: &mut DataCiteMetadata, target: &str) {
    let Some(description) = metadata
        .descriptions
        .as_mut()
        .and_then(|d| d.description.first_mut())
    else {
        return;
    };

    let kept = description
        .value
        .split_once(CONSTITUENTS_MARKER)
        .map(|(head, _)| head)
        .unwrap_or(description.value.as_str());
    description.value = format!("{}{}", kept, pointer_sentence(target));
}

fn truncate_constituents(metadata: &mut DataCiteMetadata) {
    let Some(related) = metadata.related_identifiers.as_mut() else {
        return;
    };

    related.related_identifier.retain(|r| {
        r.relation_type == RelationType::HasMetadata || r.relation_type.is_version()
    });

    if related.related_identifier.is_empty() {
        metadata.related_identifiers = None;
    }
}
