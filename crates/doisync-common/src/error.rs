//! Error types shared across the workspace

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, DoisyncError>;

/// Errors raised while parsing or converting shared values
#[derive(Error, Debug)]
pub enum DoisyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid DOI: {0}")]
    InvalidDoi(String),

    #[error("Invalid DOI status: {0}")]
    InvalidStatus(String),

    #[error("Invalid DOI type: {0}")]
    InvalidType(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),
}
