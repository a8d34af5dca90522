//! End-to-end tests for the doisync binary
//!
//! Each test runs the binary against a mock server.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

const DOI: &str = "10.15468/dl.abc123";
const TARGET: &str = "https://www.gbif.org/occurrence/download/0000001-240101000000001";

fn record(status: &str) -> serde_json::Value {
    json!({
        "doi": DOI,
        "type": "DOWNLOAD",
        "status": status,
        "target": TARGET,
        "metadata": "<resource/>",
        "created": "2024-01-01T00:00:00Z",
        "modified": "2024-01-02T00:00:00Z"
    })
}

fn doisync(server: &MockServer) -> Command {
    let mut cmd = Command::cargo_bin("doisync").unwrap();
    cmd.env("DOISYNC_SERVER_URL", server.uri())
        .env("LOG_LEVEL", "error");
    cmd
}

// ============================================================================
// status
// ============================================================================

#[tokio::test]
async fn test_status_in_sync() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/doi/10.15468/dl.abc123/diagnostics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "doi": DOI,
                "record": record("REGISTERED"),
                "remote": { "status": "REGISTERED", "target": TARGET },
                "target_matches": true,
                "metadata_matches": true
            }
        })))
        .mount(&server)
        .await;

    doisync(&server)
        .args(["status", DOI])
        .assert()
        .success()
        .stdout(predicate::str::contains(DOI))
        .stdout(predicate::str::contains("REGISTERED"))
        .stdout(predicate::str::contains("In sync"));
}

#[tokio::test]
async fn test_status_json_output() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/doi/10.15468/dl.abc123/diagnostics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "doi": DOI,
                "record": record("FAILED"),
                "remote": null,
                "target_matches": null,
                "metadata_matches": null
            }
        })))
        .mount(&server)
        .await;

    doisync(&server)
        .args(["status", DOI, "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"FAILED\""))
        .stdout(predicate::str::contains("\"remote\": null"));
}

#[tokio::test]
async fn test_status_unknown_doi_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/doi/10.15468/missing/diagnostics"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "message": "DOI '10.15468/missing' not found in database", "status": 404 }
        })))
        .mount(&server)
        .await;

    doisync(&server)
        .args(["status", "10.15468/missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

// ============================================================================
// list-failed
// ============================================================================

#[tokio::test]
async fn test_list_failed_table() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/doi/failed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [record("FAILED")]
        })))
        .mount(&server)
        .await;

    doisync(&server)
        .arg("list-failed")
        .assert()
        .success()
        .stdout(predicate::str::contains(DOI))
        .stdout(predicate::str::contains("1 FAILED DOI(s)"));
}

#[tokio::test]
async fn test_list_failed_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/doi/failed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": []
        })))
        .mount(&server)
        .await;

    doisync(&server)
        .arg("list-failed")
        .assert()
        .success()
        .stdout(predicate::str::contains("No FAILED DOIs."));
}

// ============================================================================
// export
// ============================================================================

#[tokio::test]
async fn test_export_to_file() {
    let server = MockServer::start().await;
    let document = "<resource><titles><title>GBIF Occurrence Download</title></titles></resource>";

    Mock::given(method("GET"))
        .and(path("/api/v1/doi/10.15468/dl.abc123/export"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/xml;charset=UTF-8")
                .set_body_string(document),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("doc.xml");

    doisync(&server)
        .args(["export", DOI, "--output"])
        .arg(&output)
        .assert()
        .success();

    assert_eq!(std::fs::read_to_string(&output).unwrap(), document);
}

#[tokio::test]
async fn test_export_to_stdout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/doi/10.15468/dl.abc123/export"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<resource/>"))
        .mount(&server)
        .await;

    doisync(&server)
        .args(["export", DOI])
        .assert()
        .success()
        .stdout(predicate::str::contains("<resource/>"));
}

// ============================================================================
// rerun
// ============================================================================

#[tokio::test]
async fn test_rerun_registered() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/doi/10.15468/dl.abc123/rerun"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "doi": DOI, "outcome": "REGISTERED" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    doisync(&server)
        .args(["rerun", DOI])
        .assert()
        .success()
        .stdout(predicate::str::contains("REGISTERED"));
}

#[tokio::test]
async fn test_rerun_failed_again_exits_nonzero() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/doi/10.15468/dl.abc123/rerun"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "doi": DOI, "outcome": "FAILED" }
        })))
        .mount(&server)
        .await;

    doisync(&server)
        .args(["rerun", DOI])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed again"));
}

#[tokio::test]
async fn test_rerun_without_target_reports_server_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/doi/10.15468/dl.abc123/rerun"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({
            "error": {
                "message": "no landing page stored, cannot re-run",
                "status": 502
            }
        })))
        .mount(&server)
        .await;

    doisync(&server)
        .args(["rerun", DOI])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Server error (502)"))
        .stderr(predicate::str::contains("no landing page stored"));
}

#[test]
fn test_invalid_doi_is_usage_error() {
    Command::cargo_bin("doisync")
        .unwrap()
        .args(["rerun", "not-a-doi"])
        .assert()
        .code(2);
}
