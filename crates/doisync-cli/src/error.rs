//! Error types for the doisync CLI
//!
//! Messages are user-facing and say what to check next.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// The server answered with an error envelope
    #[error("Server error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The server does not know the DOI
    #[error("DOI '{0}' not found. Check the DOI or run 'doisync list-failed'.")]
    NotFound(String),

    /// The re-run ended in FAILED again
    #[error("Re-run of '{0}' failed again. Run 'doisync status {0}' for details.")]
    RerunFailed(String),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("Network request failed: {0}. Ensure the doisync server is running and DOISYNC_SERVER_URL is correct.")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("Failed to parse server response: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Generic anyhow error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            CliError::api(503, "DOI worker 1 is no longer accepting messages").to_string(),
            "Server error (503): DOI worker 1 is no longer accepting messages"
        );
        assert!(CliError::RerunFailed("10.15468/abc".to_string())
            .to_string()
            .contains("doisync status 10.15468/abc"));
    }
}
