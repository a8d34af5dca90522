//! DOI synchronization server - main entry point

use anyhow::Result;
use doisync_common::logging::{init_logging, LogConfig};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tracing::info;

use doisync_server::{
    api::{self, AppState},
    config::Config,
    db::{create_pool, DbConfig, PgDoiStore},
    doi::{
        ApiUsageSource, ChangeNotificationProcessor, DataCiteClient, DoiGenerator, DoiStore,
        DoiSynchronizer, LifecycleReconciler, MessagePublisher, ProcessorSettings, WorkerPool,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("doisync-server")
        .filter_directives("doisync_server=debug,tower_http=info,sqlx=warn")
        .build()
        .merge_env()?;

    init_logging(&log_config)?;

    info!("Starting DOI synchronization server");

    let config = Config::load()?;
    info!(
        prefix = %config.doi.prefix,
        datacite = %config.doi.datacite.api_url,
        workers = config.doi.workers,
        "Configuration loaded - server will bind to {}:{}",
        config.server.host,
        config.server.port
    );

    let pool = create_pool(&DbConfig::from(&config.database)).await?;

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;

    info!("Database migrations completed");

    let store: Arc<dyn DoiStore> = Arc::new(PgDoiStore::new(pool));
    let client = Arc::new(DataCiteClient::new(&config.doi.datacite)?);
    let processor = Arc::new(ChangeNotificationProcessor::new(
        client,
        store.clone(),
        ProcessorSettings::from(&config.doi),
    ));

    let workers = WorkerPool::spawn(processor.clone(), config.doi.workers);
    let publisher: Arc<dyn MessagePublisher> = Arc::new(workers.publisher());

    let generator = Arc::new(DoiGenerator::new(&config.doi, store.clone(), publisher.clone())?);
    let usages = Arc::new(ApiUsageSource::new(
        &config.doi.api_root,
        Duration::from_secs(config.doi.datacite.timeout_secs),
    )?);
    let reconciler = Arc::new(LifecycleReconciler::new(generator, usages, &config.doi));

    let state = AppState {
        store,
        publisher,
        reconciler,
        synchronizer: Arc::new(DoiSynchronizer::new(processor)),
    };

    let app = api::create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let timeout = Duration::from_secs(config.server.shutdown_timeout_secs);
    info!("Draining DOI workers for up to {} seconds", timeout.as_secs());
    if !workers.shutdown(timeout).await {
        tracing::warn!("Some queued DOI changes were not processed before shutdown");
    }

    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
