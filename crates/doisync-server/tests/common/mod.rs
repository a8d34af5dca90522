//! Shared fakes and fixtures for the engine integration tests
//!
//! - [`ScriptedClient`] - registration client answering from a script and
//!   recording every call
//! - [`RecordingPublisher`] - collects change messages instead of queueing
//! - [`PagedUsages`] - usage source serving a fixed number of usages in pages
//! - [`TestPostgres`] - PostgreSQL container with migrations applied
//!   (requires Docker)

#![allow(dead_code)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use doisync_common::types::{Doi, DoiStatus};
use doisync_server::config::DoiConfig;
use doisync_server::doi::client::{ProviderError, RemoteDoi};
use doisync_server::doi::metadata::{build_download_metadata, to_xml};
use doisync_server::doi::queue::QueueError;
use doisync_server::doi::{
    ChangeDoiMessage, DoiError, DoiGenerator, DoiResult, InMemoryDoiStore, LifecycleReconciler,
    MessagePublisher, RegistrationClient, UsagePage, UsageSource,
};
use doisync_server::models::{
    Contact, ContactType, Dataset, DatasetUsage, Download, DownloadFormat, DownloadRequest,
    DownloadStatus, License, Organization, User,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use testcontainers::{core::IntoContainerPort, runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use url::Url;
use uuid::Uuid;

pub const PREFIX: &str = "10.21373";
pub const DOWNLOAD_TARGET: &str = "https://www.gbif.org/occurrence/download/0000001-240101000000001";

pub fn init_test_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,doisync_server=debug,sqlx=warn,testcontainers=info")),
        )
        .with_test_writer()
        .try_init();
}

pub fn doi(suffix: &str) -> Doi {
    Doi::new(PREFIX, suffix).unwrap()
}

pub fn test_config() -> DoiConfig {
    DoiConfig {
        prefix: PREFIX.to_string(),
        retry_pause_ms: 1,
        ..DoiConfig::default()
    }
}

// ============================================================================
// Registration Client
// ============================================================================

pub fn http(status: u16) -> ProviderError {
    ProviderError::Http {
        status,
        body: format!("HTTP {}", status),
    }
}

pub fn too_large() -> ProviderError {
    http(413)
}

pub fn unavailable() -> ProviderError {
    http(503)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Register { doi: Doi, target: Url, document: String },
    Reserve { doi: Doi, document: String },
    Delete(Doi),
    Resolve(Doi),
    Metadata(Doi),
}

/// Answers register/reserve/delete from per-operation scripts; an empty
/// script means success. Successful calls update a fake remote registry.
#[derive(Default)]
pub struct ScriptedClient {
    register_script: Mutex<VecDeque<Result<(), ProviderError>>>,
    reserve_script: Mutex<VecDeque<Result<(), ProviderError>>>,
    delete_script: Mutex<VecDeque<Result<(), ProviderError>>>,
    remote: Mutex<HashMap<Doi, (RemoteDoi, Option<String>)>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_register(&self, outcomes: impl IntoIterator<Item = Result<(), ProviderError>>) {
        self.register_script.lock().unwrap().extend(outcomes);
    }

    pub fn script_reserve(&self, outcomes: impl IntoIterator<Item = Result<(), ProviderError>>) {
        self.reserve_script.lock().unwrap().extend(outcomes);
    }

    pub fn script_delete(&self, outcomes: impl IntoIterator<Item = Result<(), ProviderError>>) {
        self.delete_script.lock().unwrap().extend(outcomes);
    }

    /// Pretend the service already knows `doi`.
    pub fn set_remote(&self, doi: &Doi, remote: RemoteDoi, document: Option<String>) {
        self.remote.lock().unwrap().insert(doi.clone(), (remote, document));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Documents submitted to `register`, in order.
    pub fn registered_documents(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Register { document, .. } => Some(document),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    fn next(script: &Mutex<VecDeque<Result<(), ProviderError>>>) -> Result<(), ProviderError> {
        script.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

#[async_trait]
impl RegistrationClient for ScriptedClient {
    async fn register(&self, doi: &Doi, target: &Url, document: &str) -> Result<(), ProviderError> {
        self.calls.lock().unwrap().push(Call::Register {
            doi: doi.clone(),
            target: target.clone(),
            document: document.to_string(),
        });
        Self::next(&self.register_script)?;
        self.set_remote(
            doi,
            RemoteDoi {
                status: DoiStatus::Registered,
                target: Some(target.clone()),
            },
            Some(document.to_string()),
        );
        Ok(())
    }

    async fn reserve(&self, doi: &Doi, document: &str) -> Result<(), ProviderError> {
        self.calls.lock().unwrap().push(Call::Reserve {
            doi: doi.clone(),
            document: document.to_string(),
        });
        Self::next(&self.reserve_script)?;
        self.set_remote(
            doi,
            RemoteDoi {
                status: DoiStatus::Reserved,
                target: None,
            },
            Some(document.to_string()),
        );
        Ok(())
    }

    async fn delete(&self, doi: &Doi) -> Result<(), ProviderError> {
        self.calls.lock().unwrap().push(Call::Delete(doi.clone()));
        Self::next(&self.delete_script)?;
        self.remote.lock().unwrap().remove(doi);
        Ok(())
    }

    async fn resolve(&self, doi: &Doi) -> Result<Option<RemoteDoi>, ProviderError> {
        self.calls.lock().unwrap().push(Call::Resolve(doi.clone()));
        Ok(self.remote.lock().unwrap().get(doi).map(|(r, _)| r.clone()))
    }

    async fn metadata(&self, doi: &Doi) -> Result<Option<String>, ProviderError> {
        self.calls.lock().unwrap().push(Call::Metadata(doi.clone()));
        Ok(self.remote.lock().unwrap().get(doi).and_then(|(_, d)| d.clone()))
    }
}

// ============================================================================
// Publisher and Usage Source
// ============================================================================

#[derive(Default)]
pub struct RecordingPublisher {
    messages: Mutex<Vec<ChangeDoiMessage>>,
}

impl RecordingPublisher {
    pub fn messages(&self) -> Vec<ChangeDoiMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn with_status(&self, status: DoiStatus) -> Vec<ChangeDoiMessage> {
        self.messages()
            .into_iter()
            .filter(|m| m.status == status)
            .collect()
    }
}

impl MessagePublisher for RecordingPublisher {
    fn publish(&self, message: ChangeDoiMessage) -> Result<(), QueueError> {
        self.messages.lock().unwrap().push(message);
        Ok(())
    }
}

/// Serves `total` usages; records every `(offset, limit)` request.
pub struct PagedUsages {
    total: usize,
    /// Most rows served per page, whatever the requested limit
    cap: Option<usize>,
    failing: bool,
    requests: Mutex<Vec<(u64, u32)>>,
}

impl PagedUsages {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            cap: None,
            failing: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Serve at most `cap` rows per page.
    pub fn capped(total: usize, cap: usize) -> Self {
        Self {
            cap: Some(cap),
            ..Self::new(total)
        }
    }

    /// Answer every request with an error.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new(0)
        }
    }

    pub fn requests(&self) -> Vec<(u64, u32)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl UsageSource for PagedUsages {
    async fn list_usages(&self, download_key: &str, offset: u64, limit: u32) -> DoiResult<UsagePage> {
        self.requests.lock().unwrap().push((offset, limit));
        if self.failing {
            return Err(DoiError::Usages {
                key: download_key.to_string(),
                message: "HTTP 503 Service Unavailable".to_string(),
            });
        }
        let rows = self.cap.map_or(limit as usize, |cap| cap.min(limit as usize));
        let start = (offset as usize).min(self.total);
        let end = (start + rows).min(self.total);
        Ok(UsagePage {
            usages: (start..end).map(usage).collect(),
            end_of_records: end >= self.total,
        })
    }
}

pub fn usage(i: usize) -> DatasetUsage {
    DatasetUsage {
        dataset_key: Uuid::from_u128(i as u128 + 1),
        dataset_title: format!("Constituent dataset {}", i),
        dataset_doi: Some(Doi::new("10.15468", format!("c{}", i)).unwrap()),
        number_records: 10,
    }
}

// ============================================================================
// Engine Wiring
// ============================================================================

pub struct SaveSide {
    pub store: Arc<InMemoryDoiStore>,
    pub publisher: Arc<RecordingPublisher>,
    pub usages: Arc<PagedUsages>,
    pub reconciler: LifecycleReconciler,
}

pub fn save_side(config: &DoiConfig, usages: usize) -> SaveSide {
    save_side_with(config, PagedUsages::new(usages))
}

pub fn save_side_with(config: &DoiConfig, usages: PagedUsages) -> SaveSide {
    let store = Arc::new(InMemoryDoiStore::new());
    let publisher = Arc::new(RecordingPublisher::default());
    let usages = Arc::new(usages);
    let generator = Arc::new(DoiGenerator::new(config, store.clone(), publisher.clone()).unwrap());
    let reconciler = LifecycleReconciler::new(generator, usages.clone(), config);
    SaveSide {
        store,
        publisher,
        usages,
        reconciler,
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn dataset(doi: Option<Doi>) -> Dataset {
    Dataset {
        key: Uuid::parse_str("7ddf754f-d193-4cc9-b351-99906754a03b").unwrap(),
        parent_dataset_key: None,
        doi,
        title: "Vascular plants of Svalbard".to_string(),
        description: Some("Herbarium records of vascular plants".to_string()),
        publishing_organization: Organization {
            key: Uuid::parse_str("4fa7b334-ce0d-4e88-aaae-2e0c138d049e").unwrap(),
            title: "Natural History Museum, University of Oslo".to_string(),
        },
        contacts: vec![Contact {
            contact_type: ContactType::Originator,
            first_name: Some("Ingrid".to_string()),
            last_name: Some("Hansen".to_string()),
            organization: None,
            user_id: None,
        }],
        keywords: vec!["plants".to_string()],
        license: Some(License::CcBy4_0),
        language: Some("eng".to_string()),
        created_by: "registry".to_string(),
        pub_date: None,
        created: Utc.with_ymd_and_hms(2018, 5, 4, 12, 0, 0).unwrap(),
        modified: Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap(),
    }
}

pub fn download(doi: Option<Doi>, status: DownloadStatus) -> Download {
    Download {
        key: "0000001-240101000000001".to_string(),
        doi,
        status,
        request: DownloadRequest {
            creator: "jdoe".to_string(),
            format: DownloadFormat::Dwca,
            query: Some("TaxonKey: Fungi".to_string()),
        },
        license: Some(License::CcBy4_0),
        total_records: 9000,
        number_datasets: 900,
        size: 123_456,
        created: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        modified: Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap(),
    }
}

pub fn user() -> User {
    User {
        user_name: "jdoe".to_string(),
        name: "Jane Doe".to_string(),
    }
}

/// Valid download document listing `usages` constituents.
pub fn download_document(doi: &Doi, usages: usize) -> String {
    let usages: Vec<DatasetUsage> = (0..usages).map(usage).collect();
    let metadata = build_download_metadata(
        &download(Some(doi.clone()), DownloadStatus::Succeeded),
        &user(),
        &usages,
        "https://api.gbif.org/v1/",
    );
    to_xml(doi, &metadata).unwrap()
}

pub fn download_target() -> Url {
    Url::parse(DOWNLOAD_TARGET).unwrap()
}

// ============================================================================
// PostgreSQL Test Container
// ============================================================================

pub struct TestPostgres {
    _container: ContainerAsync<Postgres>,
    pool: PgPool,
}

impl TestPostgres {
    /// Start PostgreSQL and apply the migrations.
    pub async fn start() -> Result<Self> {
        let container = Postgres::default()
            .with_tag("16-alpine")
            .start()
            .await
            .context("Failed to start PostgreSQL container")?;

        let host = container
            .get_host()
            .await
            .context("Failed to get container host")?;
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .await
            .context("Failed to get container port")?;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&format!("postgresql://postgres:postgres@{}:{}/postgres", host, port))
            .await
            .context("Failed to connect to PostgreSQL")?;

        sqlx::migrate!("../../migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            _container: container,
            pool,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
