//! DOI API routes
//!
//! # Route Structure
//!
//! - `POST /api/v1/doi/changes` - Enqueue a change message
//! - `POST /api/v1/doi/mint` - Mint a new dataset or download DOI
//! - `GET /api/v1/doi/failed` - List FAILED records
//! - `GET /api/v1/doi/:prefix/:suffix` - Local record
//! - `GET /api/v1/doi/:prefix/:suffix/diagnostics` - Local vs remote state
//! - `GET /api/v1/doi/:prefix/:suffix/export` - Stored document as XML
//! - `POST /api/v1/doi/:prefix/:suffix/rerun` - Register the stored document again
//! - `POST /api/v1/events/dataset` - A dataset was saved
//! - `POST /api/v1/events/download` - A download was saved
//!
//! Suffixes containing `/` must be percent-encoded.

use super::response::ApiResponse;
use super::AppState;
use crate::doi::queue::ChangeDoiMessage;
use crate::doi::synchronizer::Diagnostics;
use crate::doi::{IdentifierRecord, Outcome};
use crate::error::AppError;
use crate::models::{Dataset, Download, User};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use doisync_common::types::{Doi, DoiStatus, DoiType};
use serde::{Deserialize, Serialize};

// ============================================================================
// Router Configuration
// ============================================================================

pub fn doi_routes() -> Router<AppState> {
    Router::new()
        .route("/doi/changes", post(enqueue_change))
        .route("/doi/mint", post(mint))
        .route("/doi/failed", get(list_failed))
        .route("/doi/:prefix/:suffix", get(get_record))
        .route("/doi/:prefix/:suffix/diagnostics", get(diagnose))
        .route("/doi/:prefix/:suffix/export", get(export))
        .route("/doi/:prefix/:suffix/rerun", post(rerun))
        .route("/events/dataset", post(dataset_changed))
        .route("/events/download", post(download_changed))
}

fn parse_doi(prefix: &str, suffix: &str) -> Result<Doi, AppError> {
    Doi::new(prefix, suffix).map_err(|e| AppError::BadRequest(e.to_string()))
}

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct Accepted {
    pub doi: Doi,
    pub status: DoiStatus,
}

#[derive(Debug, Deserialize)]
pub struct MintRequest {
    #[serde(rename = "type")]
    pub kind: DoiType,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RerunResult {
    pub doi: Doi,
    pub outcome: String,
}

#[derive(Debug, Deserialize)]
pub struct DatasetChanged {
    pub dataset: Dataset,
    #[serde(default)]
    pub previous_doi: Option<Doi>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadChanged {
    pub download: Download,
    #[serde(default)]
    pub previous: Option<Download>,
    pub user: User,
}

// ============================================================================
// Handlers
// ============================================================================

/// `POST /api/v1/doi/changes`
///
/// - `202 Accepted` - handed to a worker
/// - `503 Service Unavailable` - worker pool stopped
#[tracing::instrument(skip(state, message), fields(doi = %message.doi, status = %message.status))]
async fn enqueue_change(
    State(state): State<AppState>,
    Json(message): Json<ChangeDoiMessage>,
) -> Result<Response, AppError> {
    let accepted = Accepted {
        doi: message.doi.clone(),
        status: message.status,
    };
    state
        .publisher
        .publish(message)
        .map_err(|e| AppError::Unavailable(e.to_string()))?;

    Ok(ApiResponse::success(accepted).with_status(StatusCode::ACCEPTED))
}

/// `POST /api/v1/doi/mint` with `{"type": "DATASET" | "DOWNLOAD"}`
async fn mint(State(state): State<AppState>, Json(request): Json<MintRequest>) -> Result<Response, AppError> {
    let generator = state.reconciler.generator();
    let doi = match request.kind {
        DoiType::Dataset => generator.new_dataset_doi().await?,
        DoiType::Download => generator.new_download_doi().await?,
    };
    tracing::info!(%doi, kind = %request.kind, "DOI minted via API");
    Ok(ApiResponse::success(doi).with_status(StatusCode::CREATED))
}

async fn list_failed(State(state): State<AppState>) -> Result<ApiResponse<Vec<IdentifierRecord>>, AppError> {
    Ok(ApiResponse::success(state.synchronizer.list_failed().await?))
}

async fn get_record(
    State(state): State<AppState>,
    Path((prefix, suffix)): Path<(String, String)>,
) -> Result<ApiResponse<IdentifierRecord>, AppError> {
    let doi = parse_doi(&prefix, &suffix)?;
    let record = state
        .store
        .get(&doi)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("DOI '{}' not found", doi)))?;
    Ok(ApiResponse::success(record))
}

async fn diagnose(
    State(state): State<AppState>,
    Path((prefix, suffix)): Path<(String, String)>,
) -> Result<ApiResponse<Diagnostics>, AppError> {
    let doi = parse_doi(&prefix, &suffix)?;
    Ok(ApiResponse::success(state.synchronizer.diagnose(&doi).await?))
}

/// `GET /api/v1/doi/:prefix/:suffix/export`
///
/// - `200 OK` - `application/xml` body
/// - `404 Not Found` - unknown DOI or no stored document
async fn export(
    State(state): State<AppState>,
    Path((prefix, suffix)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let doi = parse_doi(&prefix, &suffix)?;
    let document = state
        .synchronizer
        .export(&doi)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No document stored for DOI '{}'", doi)))?;
    Ok(([(header::CONTENT_TYPE, "application/xml;charset=UTF-8")], document).into_response())
}

#[tracing::instrument(skip(state))]
async fn rerun(
    State(state): State<AppState>,
    Path((prefix, suffix)): Path<(String, String)>,
) -> Result<ApiResponse<RerunResult>, AppError> {
    let doi = parse_doi(&prefix, &suffix)?;
    let outcome: Outcome = state.synchronizer.rerun(&doi).await?;
    Ok(ApiResponse::success(RerunResult {
        doi,
        outcome: format!("{:?}", outcome).to_uppercase(),
    }))
}

#[tracing::instrument(skip(state, event), fields(dataset = %event.dataset.key))]
async fn dataset_changed(State(state): State<AppState>, Json(event): Json<DatasetChanged>) -> StatusCode {
    state
        .reconciler
        .dataset_changed(&event.dataset, event.previous_doi.as_ref())
        .await;
    StatusCode::ACCEPTED
}

#[tracing::instrument(skip(state, event), fields(download = %event.download.key))]
async fn download_changed(State(state): State<AppState>, Json(event): Json<DownloadChanged>) -> StatusCode {
    state
        .reconciler
        .download_changed(&event.download, event.previous.as_ref(), &event.user)
        .await;
    StatusCode::ACCEPTED
}
