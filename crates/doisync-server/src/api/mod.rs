//! HTTP surface of the DOI service
//!
//! Operators and the registry reach the engine through this router; the
//! `doisync` CLI is a client of it.

pub mod response;
pub mod routes;

use crate::doi::{DoiStore, DoiSynchronizer, LifecycleReconciler, MessagePublisher};
use crate::middleware;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use std::sync::Arc;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DoiStore>,
    pub publisher: Arc<dyn MessagePublisher>,
    pub reconciler: Arc<LifecycleReconciler>,
    pub synchronizer: Arc<DoiSynchronizer>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", routes::doi_routes())
        .with_state(state)
        .layer(middleware::tracing_layer())
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": "connected",
                "version": env!("CARGO_PKG_VERSION"),
            })),
        ),
        Err(e) => {
            tracing::error!("Database health check failed: {:?}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "database": "unreachable",
                    "version": env!("CARGO_PKG_VERSION"),
                })),
            )
        },
    }
}
