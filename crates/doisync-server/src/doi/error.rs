//! Error taxonomy of the identifier engine

use crate::db::DbError;
use doisync_common::types::Doi;
use thiserror::Error;

pub type DoiResult<T> = Result<T, DoiError>;

/// Errors raised by the engine.
///
/// The first three variants are the classified outcome of a provider call
/// (see [`super::client::classify`]). Store errors are never retried.
#[derive(Error, Debug)]
pub enum DoiError {
    /// Network hiccup, timeout or 5xx; worth another attempt
    #[error("Transient registration failure for {doi}: {message}")]
    Transient { doi: Doi, message: String },

    /// Provider refused the document because it is too large
    #[error("Registration document for {doi} rejected as too large: {message}")]
    SizeRejected { doi: Doi, message: String },

    /// Anything else the provider refuses
    #[error("Registration for {doi} failed permanently: {message}")]
    Unrecoverable { doi: Doi, message: String },

    /// Document failed schema checks before any network call
    #[error("Invalid registration metadata for {doi}: {message}")]
    InvalidMetadata { doi: Doi, message: String },

    #[error(transparent)]
    Store(#[from] DbError),

    /// Constituent datasets of a download could not be listed
    #[error("Failed to list dataset usages of download {key}: {message}")]
    Usages { key: String, message: String },

    /// Change message could not be handed to a worker
    #[error("Failed to enqueue change for {doi}: {message}")]
    Queue { doi: Doi, message: String },
}

impl DoiError {
    pub fn invalid_metadata(doi: &Doi, message: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            doi: doi.clone(),
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}
