//! Identifier status and owner kind

use crate::error::DoisyncError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Doi;

/// Lifecycle status of a locally tracked DOI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DoiStatus {
    /// Minted locally, never sent to the registration service
    New,
    /// Known to the registration service as a draft
    Reserved,
    /// Registered and resolvable
    Registered,
    /// Last synchronization attempt ended without success
    Failed,
    /// Soft-deleted; the record is kept for audit
    Deleted,
}

impl DoiStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DoiStatus::New => "NEW",
            DoiStatus::Reserved => "RESERVED",
            DoiStatus::Registered => "REGISTERED",
            DoiStatus::Failed => "FAILED",
            DoiStatus::Deleted => "DELETED",
        }
    }
}

impl FromStr for DoiStatus {
    type Err = DoisyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NEW" => Ok(DoiStatus::New),
            "RESERVED" => Ok(DoiStatus::Reserved),
            "REGISTERED" => Ok(DoiStatus::Registered),
            "FAILED" => Ok(DoiStatus::Failed),
            "DELETED" => Ok(DoiStatus::Deleted),
            _ => Err(DoisyncError::InvalidStatus(s.to_string())),
        }
    }
}

impl fmt::Display for DoiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of entity owning a DOI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DoiType {
    Dataset,
    Download,
}

impl DoiType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DoiType::Dataset => "DATASET",
            DoiType::Download => "DOWNLOAD",
        }
    }

    /// Suffix shoulder used when minting DOIs of this kind.
    pub fn shoulder(&self) -> &'static str {
        match self {
            DoiType::Dataset => "",
            DoiType::Download => "dl.",
        }
    }

    /// Infer the owner kind of a DOI from its suffix shoulder.
    pub fn from_doi(doi: &Doi) -> Self {
        if doi.suffix().starts_with(DoiType::Download.shoulder()) {
            DoiType::Download
        } else {
            DoiType::Dataset
        }
    }
}

impl FromStr for DoiType {
    type Err = DoisyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DATASET" => Ok(DoiType::Dataset),
            "DOWNLOAD" => Ok(DoiType::Download),
            _ => Err(DoisyncError::InvalidType(s.to_string())),
        }
    }
}

impl fmt::Display for DoiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_str() {
        assert_eq!("registered".parse::<DoiStatus>().unwrap(), DoiStatus::Registered);
        assert_eq!("FAILED".parse::<DoiStatus>().unwrap(), DoiStatus::Failed);
        assert!("MINTED".parse::<DoiStatus>().is_err());
    }

    #[test]
    fn test_status_serde_matches_as_str() {
        for status in [
            DoiStatus::New,
            DoiStatus::Reserved,
            DoiStatus::Registered,
            DoiStatus::Failed,
            DoiStatus::Deleted,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_type_from_doi() {
        let download = Doi::new("10.15468", "dl.abc123").unwrap();
        let dataset = Doi::new("10.15468", "q2w3e4").unwrap();

        assert_eq!(DoiType::from_doi(&download), DoiType::Download);
        assert_eq!(DoiType::from_doi(&dataset), DoiType::Dataset);
    }
}
