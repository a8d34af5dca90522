//! Operator diagnostics and re-run tests

mod common;

use chrono::Utc;
use common::*;
use doisync_common::types::{Doi, DoiStatus, DoiType};
use doisync_server::db::DbError;
use doisync_server::doi::client::RemoteDoi;
use doisync_server::doi::{
    ChangeDoiMessage, ChangeNotificationProcessor, DoiError, DoiStore, DoiSynchronizer,
    IdentifierRecord, InMemoryDoiStore, Outcome, ProcessorSettings,
};
use std::sync::Arc;
use std::time::Duration;

struct Fixture {
    store: Arc<InMemoryDoiStore>,
    client: Arc<ScriptedClient>,
    processor: Arc<ChangeNotificationProcessor>,
    synchronizer: DoiSynchronizer,
}

fn fixture() -> Fixture {
    init_test_tracing();
    let store = Arc::new(InMemoryDoiStore::new());
    let client = Arc::new(ScriptedClient::new());
    let processor = Arc::new(ChangeNotificationProcessor::new(
        client.clone(),
        store.clone(),
        ProcessorSettings {
            max_attempts: 2,
            retry_pause: Duration::from_millis(1),
            allow_reserved_delete: false,
        },
    ));
    Fixture {
        store,
        client,
        synchronizer: DoiSynchronizer::new(processor.clone()),
        processor,
    }
}

async fn registered(fixture: &Fixture, doi: &Doi) {
    fixture.store.create(doi, DoiType::Download).await.unwrap();
    let outcome = fixture
        .processor
        .handle(ChangeDoiMessage::register(
            doi.clone(),
            download_target(),
            download_document(doi, 2),
        ))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Registered);
}

#[tokio::test]
async fn test_diagnose_registered_doi_in_sync() {
    let fixture = fixture();
    let doi = doi("dl.abc123");
    registered(&fixture, &doi).await;

    let diagnostics = fixture.synchronizer.diagnose(&doi).await.unwrap();

    assert!(diagnostics.exists_remotely());
    assert_eq!(diagnostics.target_matches, Some(true));
    assert_eq!(diagnostics.metadata_matches, Some(true));
    assert!(diagnostics.in_sync());
}

#[tokio::test]
async fn test_diagnose_detects_drift() {
    let fixture = fixture();
    let doi = doi("dl.abc123");
    registered(&fixture, &doi).await;

    let elsewhere = url::Url::parse("https://example.org/elsewhere").unwrap();
    fixture.client.set_remote(
        &doi,
        RemoteDoi {
            status: DoiStatus::Registered,
            target: Some(elsewhere),
        },
        Some(download_document(&doi, 5)),
    );

    let diagnostics = fixture.synchronizer.diagnose(&doi).await.unwrap();

    assert_eq!(diagnostics.target_matches, Some(false));
    assert_eq!(diagnostics.metadata_matches, Some(false));
    assert!(!diagnostics.in_sync());
}

#[tokio::test]
async fn test_diagnose_unknown_everywhere() {
    let fixture = fixture();

    let diagnostics = fixture.synchronizer.diagnose(&doi("nothing")).await.unwrap();

    assert!(diagnostics.record.is_none());
    assert!(!diagnostics.exists_remotely());
    assert!(!diagnostics.in_sync());
}

#[tokio::test]
async fn test_list_failed_and_rerun() {
    let fixture = fixture();
    let doi = doi("dl.abc123");
    fixture.store.create(&doi, DoiType::Download).await.unwrap();
    fixture
        .client
        .script_register([Err(unavailable()), Err(unavailable())]);

    let outcome = fixture
        .processor
        .handle(ChangeDoiMessage::register(
            doi.clone(),
            download_target(),
            download_document(&doi, 2),
        ))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Failed);

    let failed = fixture.synchronizer.list_failed().await.unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].doi, doi);

    // a failed first registration has no stored landing page
    let err = fixture.synchronizer.rerun(&doi).await.unwrap_err();
    assert!(matches!(err, DoiError::Unrecoverable { .. }));
}

#[tokio::test]
async fn test_rerun_failed_update_of_registered_doi() {
    let fixture = fixture();
    let doi = doi("dl.abc123");
    registered(&fixture, &doi).await;

    fixture
        .client
        .script_register([Err(http(400))]);
    let outcome = fixture
        .processor
        .handle(ChangeDoiMessage::register(
            doi.clone(),
            download_target(),
            download_document(&doi, 3),
        ))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Failed);

    let outcome = fixture.synchronizer.rerun(&doi).await.unwrap();

    assert_eq!(outcome, Outcome::Registered);
    let record = fixture.store.get(&doi).await.unwrap().unwrap();
    assert_eq!(record.status, DoiStatus::Registered);
    assert_eq!(record.metadata, Some(download_document(&doi, 3)));
    assert!(fixture.synchronizer.list_failed().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rerun_rejects_unparsable_document() {
    let fixture = fixture();
    let doi = doi("abc");
    let now = Utc::now();
    fixture
        .store
        .insert(IdentifierRecord {
            doi: doi.clone(),
            kind: DoiType::Dataset,
            owner_key: None,
            status: DoiStatus::Failed,
            target: Some(download_target()),
            metadata: Some("Caused by: timeout <".to_string()),
            created: now,
            modified: now,
        })
        .await;

    let err = fixture.synchronizer.rerun(&doi).await.unwrap_err();

    assert!(matches!(err, DoiError::InvalidMetadata { .. }));
    assert!(fixture.client.calls().is_empty());
}

#[tokio::test]
async fn test_export_returns_stored_document() {
    let fixture = fixture();
    let doi = doi("dl.abc123");
    registered(&fixture, &doi).await;

    let document = fixture.synchronizer.export(&doi).await.unwrap();
    assert_eq!(document, Some(download_document(&doi, 2)));
}

#[tokio::test]
async fn test_export_unknown_doi_is_not_found() {
    let fixture = fixture();

    let err = fixture.synchronizer.export(&doi("missing")).await.unwrap_err();

    assert!(matches!(err, DoiError::Store(DbError::NotFound(_))));
}
