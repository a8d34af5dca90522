//! DataCite MDS client tests against a mock HTTP server

mod common;

use common::{doi, download_target, init_test_tracing};
use doisync_common::types::DoiStatus;
use doisync_server::config::DataCiteConfig;
use doisync_server::doi::client::{FailureKind, ProviderError};
use doisync_server::doi::{DataCiteClient, RegistrationClient};
use wiremock::matchers::{basic_auth, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOCUMENT: &str = "<resource>document</resource>";

async fn setup() -> (MockServer, DataCiteClient) {
    init_test_tracing();
    let server = MockServer::start().await;
    let client = DataCiteClient::new(&DataCiteConfig {
        api_url: server.uri(),
        username: "GBIF.GBIF".to_string(),
        password: "secret".to_string(),
        timeout_secs: 5,
    })
    .unwrap();
    (server, client)
}

#[tokio::test]
async fn test_register_uploads_metadata_then_target() {
    let (server, client) = setup().await;
    let doi = doi("dl.abc123");

    Mock::given(method("PUT"))
        .and(path("/metadata/10.21373/dl.abc123"))
        .and(basic_auth("GBIF.GBIF", "secret"))
        .and(header("content-type", "application/xml;charset=UTF-8"))
        .and(body_string(DOCUMENT))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/doi/10.21373/dl.abc123"))
        .and(basic_auth("GBIF.GBIF", "secret"))
        .and(body_string(format!(
            "doi=10.21373/dl.abc123\nurl={}",
            download_target()
        )))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    client
        .register(&doi, &download_target(), DOCUMENT)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_register_stops_when_metadata_rejected() {
    let (server, client) = setup().await;
    let doi = doi("dl.abc123");

    Mock::given(method("PUT"))
        .and(path("/metadata/10.21373/dl.abc123"))
        .respond_with(ResponseTemplate::new(413).set_body_string("Request Entity Too Large"))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/doi/10.21373/dl.abc123"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let err = client
        .register(&doi, &download_target(), DOCUMENT)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::SizeRejected);
    match err {
        ProviderError::Http { status, body } => {
            assert_eq!(status, 413);
            assert_eq!(body, "Request Entity Too Large");
        },
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_server_errors_are_transient() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/metadata/10.21373/abc"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client.reserve(&doi("abc"), DOCUMENT).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Transient);
}

#[tokio::test]
async fn test_bad_request_is_unrecoverable() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/metadata/10.21373/abc"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad xml"))
        .mount(&server)
        .await;

    let err = client.reserve(&doi("abc"), DOCUMENT).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Unrecoverable);
}

#[tokio::test]
async fn test_resolve_reports_remote_state() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/doi/10.21373/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/doi/10.21373/reserved"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/doi/10.21373/registered"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("{}\n", download_target())))
        .mount(&server)
        .await;

    assert!(client.resolve(&doi("missing")).await.unwrap().is_none());

    let reserved = client.resolve(&doi("reserved")).await.unwrap().unwrap();
    assert_eq!(reserved.status, DoiStatus::Reserved);
    assert!(reserved.target.is_none());

    let registered = client.resolve(&doi("registered")).await.unwrap().unwrap();
    assert_eq!(registered.status, DoiStatus::Registered);
    assert_eq!(registered.target, Some(download_target()));
}

#[tokio::test]
async fn test_resolve_garbage_target_is_protocol_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/doi/10.21373/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not a url"))
        .mount(&server)
        .await;

    let err = client.resolve(&doi("abc")).await.unwrap_err();
    assert!(matches!(err, ProviderError::Protocol(_)));
}

#[tokio::test]
async fn test_metadata_fetch() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/metadata/10.21373/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DOCUMENT))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/metadata/10.21373/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert_eq!(
        client.metadata(&doi("abc")).await.unwrap().as_deref(),
        Some(DOCUMENT)
    );
    assert!(client.metadata(&doi("missing")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_reserved_doi() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/doi/10.21373/dl.abc123"))
        .and(basic_auth("GBIF.GBIF", "secret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.delete(&doi("dl.abc123")).await.unwrap();
}
