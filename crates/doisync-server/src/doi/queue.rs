//! Change messages between the entity-save path and the network workers

use doisync_common::types::{Doi, DoiStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Request to bring a DOI to `status` at the registration service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeDoiMessage {
    pub doi: Doi,
    pub status: DoiStatus,
    #[serde(default)]
    pub target: Option<Url>,
    /// Registration document; absent for deletes
    #[serde(default)]
    pub metadata: Option<String>,
}

impl ChangeDoiMessage {
    pub fn register(doi: Doi, target: Url, metadata: String) -> Self {
        Self {
            doi,
            status: DoiStatus::Registered,
            target: Some(target),
            metadata: Some(metadata),
        }
    }

    pub fn reserve(doi: Doi, metadata: String) -> Self {
        Self {
            doi,
            status: DoiStatus::Reserved,
            target: None,
            metadata: Some(metadata),
        }
    }

    pub fn delete(doi: Doi) -> Self {
        Self {
            doi,
            status: DoiStatus::Deleted,
            target: None,
            metadata: None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("DOI worker {0} is no longer accepting messages")]
    Closed(usize),

    #[error("No DOI workers are running")]
    NoWorkers,
}

/// Hands change messages to the asynchronous workers without blocking.
pub trait MessagePublisher: Send + Sync {
    fn publish(&self, message: ChangeDoiMessage) -> Result<(), QueueError>;
}
