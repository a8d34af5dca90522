//! API request/response types
//!
//! Mirrors of the server's JSON bodies.

use chrono::{DateTime, Utc};
use doisync_common::types::{Doi, DoiStatus, DoiType};
use serde::{Deserialize, Serialize};

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

/// Error envelope: `{"error": {"message", "status"}}`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    pub status: u16,
}

/// Local record of one DOI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifierRecord {
    pub doi: Doi,
    #[serde(rename = "type")]
    pub kind: DoiType,
    #[serde(default)]
    pub owner_key: Option<String>,
    pub status: DoiStatus,
    pub target: Option<String>,
    pub metadata: Option<String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// What DataCite knows about a DOI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteDoi {
    pub status: DoiStatus,
    pub target: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostics {
    pub doi: Doi,
    pub record: Option<IdentifierRecord>,
    pub remote: Option<RemoteDoi>,
    pub target_matches: Option<bool>,
    pub metadata_matches: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerunResult {
    pub doi: Doi,
    /// `REGISTERED`, `FAILED`, ...
    pub outcome: String,
}
