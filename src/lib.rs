//! urlscraper -- accepts submitted URLs, validates them in the background,
//! and keeps a bounded, ranked record of the most recently submitted ones.
//!
//! This crate provides the record store, the ingestion pipeline with its
//! periodic benchmark refresh, the HTTP probe, and the REST API.

pub mod api;
pub mod config;
pub mod ingest;
pub mod probes;
pub mod storage;
pub mod telemetry;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::api::state::AppState;
use crate::config::Config;
use crate::ingest::Processor;
use crate::probes::HttpProbe;
use crate::storage::RecordStore;

/// Run the service: record store, ingestion pipeline, and API server.
///
/// Returns after a shutdown signal once in-flight requests are answered and
/// the ingestion pipeline has drained.
pub async fn serve(config: Config) -> Result<()> {
    config.validate()?;

    // 1. Record store
    let store = Arc::new(RecordStore::new(config.store.capacity));

    // 2. HTTP probe
    let probe = Arc::new(
        HttpProbe::new(config.client.timeout()).context("failed to build HTTP client")?,
    );

    // 3. Ingestion pipeline (background workers + refresh loop)
    let processor = Arc::new(Processor::start(&config.ingest, Arc::clone(&store), probe));

    // 4. API server
    let state = AppState {
        store,
        processor: Arc::clone(&processor),
        fetch_limit: config.server.fetch_limit,
        enqueue_timeout: config.server.enqueue_timeout(),
    };
    let app = api::router(state);

    let addr: SocketAddr = config
        .server
        .listen_address
        .parse()
        .with_context(|| format!("invalid listen address: {}", config.server.listen_address))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind TCP listener on {}", addr))?;

    info!(%addr, store_capacity = config.store.capacity, "urlscraper listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    // 5. Drain the pipeline
    info!("HTTP server stopped, draining ingestion pipeline");
    processor.shutdown().await;
    info!("shutdown complete");

    Ok(())
}

/// Resolve on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
