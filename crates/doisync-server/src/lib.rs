//! DOI synchronization server library
//!
//! Keeps the DOIs of registry datasets and downloads in step with the
//! DataCite registration service.
//!
//! # Overview
//!
//! - **Engine** ([`doi`]): reconciler, generator facade, change processor,
//!   payload reducer and worker pool
//! - **Record store** ([`db`]): PostgreSQL table of identifier records
//! - **HTTP API** ([`api`]): change intake, record lookup and operator
//!   diagnostics
//! - **Configuration** ([`config`]): environment-based settings
//!
//! # Example
//!
//! ```no_run
//! use doisync_server::config::Config;
//! use doisync_server::db::{create_pool, DbConfig, PgDoiStore};
//! use doisync_server::doi::{ChangeNotificationProcessor, DataCiteClient, WorkerPool};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = create_pool(&DbConfig::from(&config.database)).await?;
//!     let processor = ChangeNotificationProcessor::new(
//!         Arc::new(DataCiteClient::new(&config.doi.datacite)?),
//!         Arc::new(PgDoiStore::new(pool)),
//!         (&config.doi).into(),
//!     );
//!     let workers = WorkerPool::spawn(Arc::new(processor), config.doi.workers);
//!     let _publisher = workers.publisher();
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod doi;
pub mod error;
pub mod middleware;
pub mod models;

pub use error::AppError;
