//! DOI lifecycle engine
//!
//! # Overview
//!
//! Datasets and downloads in the registry carry DOIs that must be kept in
//! step with an external registration service. The engine is split in two
//! halves joined by a message channel:
//!
//! - the **save path**: [`reconciler::LifecycleReconciler`] reacts to entity
//!   changes, builds documents ([`metadata`]) and hands them to
//!   [`generator::DoiGenerator`], which validates them and publishes a
//!   [`queue::ChangeDoiMessage`];
//! - the **network path**: [`worker::WorkerPool`] feeds messages to
//!   [`processor::ChangeNotificationProcessor`], which talks to the
//!   [`client::RegistrationClient`], shrinks oversized documents with
//!   [`reducer`] and writes the outcome to the [`store::DoiStore`].
//!
//! [`synchronizer::DoiSynchronizer`] serves operators inspecting and
//! re-running FAILED records.

pub mod client;
pub mod error;
pub mod generator;
pub mod metadata;
pub mod processor;
pub mod queue;
pub mod reconciler;
pub mod reducer;
pub mod store;
pub mod synchronizer;
pub mod usages;
pub mod worker;

pub use client::{DataCiteClient, RegistrationClient};
pub use error::{DoiError, DoiResult};
pub use generator::DoiGenerator;
pub use processor::{ChangeNotificationProcessor, Outcome, ProcessorSettings};
pub use queue::{ChangeDoiMessage, MessagePublisher};
pub use reconciler::LifecycleReconciler;
pub use store::{DoiStore, IdentifierRecord, InMemoryDoiStore};
pub use synchronizer::DoiSynchronizer;
pub use usages::{ApiUsageSource, UsagePage, UsageSource};
pub use worker::WorkerPool;
