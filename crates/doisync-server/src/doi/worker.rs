//! Worker pool consuming change messages
//!
//! Each worker owns one unbounded channel and processes its messages one at
//! a time. [`ShardedPublisher`] routes a message by a hash of its DOI, so all
//! changes to one DOI land on the same worker and are handled in order, each
//! to completion, while different DOIs proceed in parallel.

use super::processor::ChangeNotificationProcessor;
use super::queue::{ChangeDoiMessage, MessagePublisher, QueueError};
use doisync_common::logging::ALERT_TARGET;
use doisync_common::types::Doi;
use futures::future::join_all;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

type Sender = mpsc::UnboundedSender<ChangeDoiMessage>;

pub struct WorkerPool {
    senders: Arc<[Sender]>,
    handles: Vec<JoinHandle<()>>,
    shutdown: watch::Sender<bool>,
}

impl WorkerPool {
    /// Start `workers` workers (at least one) on the current runtime.
    pub fn spawn(processor: Arc<ChangeNotificationProcessor>, workers: usize) -> Self {
        let workers = workers.max(1);
        let (shutdown, shutdown_rx) = watch::channel(false);

        let mut senders = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let (tx, rx) = mpsc::unbounded_channel();
            senders.push(tx);
            handles.push(tokio::spawn(run_worker(
                worker_id,
                processor.clone(),
                rx,
                shutdown_rx.clone(),
            )));
        }

        tracing::info!(workers, "DOI worker pool started");

        Self {
            senders: senders.into(),
            handles,
            shutdown,
        }
    }

    pub fn publisher(&self) -> ShardedPublisher {
        ShardedPublisher {
            senders: self.senders.clone(),
        }
    }

    pub fn size(&self) -> usize {
        self.senders.len()
    }

    /// Stop accepting messages and drain what is queued.
    ///
    /// Returns `false` if the workers did not finish within `timeout`.
    pub async fn shutdown(self, timeout: Duration) -> bool {
        let _ = self.shutdown.send(true);
        match tokio::time::timeout(timeout, join_all(self.handles)).await {
            Ok(results) => {
                for result in results {
                    if let Err(e) = result {
                        tracing::error!(error = %e, "DOI worker panicked");
                    }
                }
                tracing::info!("DOI worker pool stopped");
                true
            },
            Err(_) => {
                tracing::warn!(?timeout, "DOI workers did not drain in time");
                false
            },
        }
    }
}

async fn run_worker(
    worker_id: usize,
    processor: Arc<ChangeNotificationProcessor>,
    mut receiver: mpsc::UnboundedReceiver<ChangeDoiMessage>,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::debug!(worker_id, "DOI worker started");

    loop {
        tokio::select! {
            message = receiver.recv() => match message {
                Some(message) => process(worker_id, &processor, message).await,
                None => break,
            },
            _ = shutdown.changed() => {
                receiver.close();
                while let Some(message) = receiver.recv().await {
                    process(worker_id, &processor, message).await;
                }
                break;
            },
        }
    }

    tracing::debug!(worker_id, "DOI worker stopped");
}

async fn process(worker_id: usize, processor: &ChangeNotificationProcessor, message: ChangeDoiMessage) {
    let doi = message.doi.clone();
    if let Err(e) = processor.handle(message).await {
        tracing::error!(target: ALERT_TARGET, worker_id, %doi, error = %e, "DOI change could not be stored");
    }
}

/// Routes messages to workers by DOI
#[derive(Clone)]
pub struct ShardedPublisher {
    senders: Arc<[Sender]>,
}

impl MessagePublisher for ShardedPublisher {
    fn publish(&self, message: ChangeDoiMessage) -> Result<(), QueueError> {
        if self.senders.is_empty() {
            return Err(QueueError::NoWorkers);
        }
        let worker = shard(&message.doi, self.senders.len());
        self.senders[worker]
            .send(message)
            .map_err(|_| QueueError::Closed(worker))
    }
}

/// Worker index for `doi`; stable for the life of the process.
pub fn shard(doi: &Doi, workers: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    doi.hash(&mut hasher);
    (hasher.finish() % workers.max(1) as u64) as usize
}
