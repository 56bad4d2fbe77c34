//! Ingestion pipeline -- bounded intake queue, validation workers, and the
//! periodic benchmark refresh.
//!
//! [`Processor::ingest`] only enqueues. A long-lived [`pool::WorkerPool`]
//! drains the queue, probes each URL, and stores the ones that respond.
//! Independently, [`refresh::run_refresh_loop`] re-benchmarks the most
//! recently touched URLs on a timer.

pub mod pool;
pub mod refresh;
pub mod report;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use self::pool::WorkerPool;
use crate::config::IngestConfig;
use crate::probes::Probe;
use crate::storage::RecordStore;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("request to enqueue expired")]
    EnqueueTimeout,

    #[error("ingestion processor is shut down")]
    Closed,
}

// ---------------------------------------------------------------------------
// Processor
// ---------------------------------------------------------------------------

/// Accepts URLs for asynchronous validation and keeps stored URLs
/// benchmarked.
pub struct Processor {
    /// `None` once shut down.
    intake: RwLock<Option<mpsc::Sender<String>>>,
    cancel: CancellationToken,
    background: Mutex<Option<JoinHandle<()>>>,
}

impl Processor {
    /// Start the intake workers and the refresh loop.
    ///
    /// Must be called from within a tokio runtime. `config` is expected to
    /// have passed [`crate::config::Config::validate`].
    pub fn start(config: &IngestConfig, store: Arc<RecordStore>, probe: Arc<dyn Probe>) -> Self {
        let (intake_tx, intake_rx) = mpsc::channel(config.queue_capacity);
        let cancel = CancellationToken::new();

        let background = tokio::spawn(run(
            config.clone(),
            store,
            probe,
            intake_rx,
            cancel.clone(),
        ));

        info!(
            queue_capacity = config.queue_capacity,
            workers = config.workers,
            refresh_interval_sec = config.refresh_interval_sec,
            refresh_batch_size = config.refresh_batch_size,
            "ingestion processor started"
        );

        Self {
            intake: RwLock::new(Some(intake_tx)),
            cancel,
            background: Mutex::new(Some(background)),
        }
    }

    /// Enqueue `url` for validation.
    ///
    /// Waits while the intake queue is full. Returns
    /// [`IngestError::EnqueueTimeout`] if no slot frees up before
    /// `deadline`; the URL is then not enqueued. Handling that error is up to
    /// the caller.
    pub async fn ingest(&self, deadline: Instant, url: &str) -> Result<(), IngestError> {
        let intake = self.intake.read().await.clone().ok_or(IngestError::Closed)?;

        match tokio::time::timeout_at(deadline, intake.send(url.to_string())).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(IngestError::Closed),
            Err(_) => Err(IngestError::EnqueueTimeout),
        }
    }

    /// Stop accepting URLs, stop the refresh loop, and wait for the workers
    /// to finish what is already queued.
    ///
    /// Calling this more than once is harmless.
    pub async fn shutdown(&self) {
        if self.intake.write().await.take().is_some() {
            info!("closing intake queue");
        }
        self.cancel.cancel();

        if let Some(handle) = self.background.lock().await.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "ingestion task failed");
            }
        }
    }
}

/// Background half of the processor: validation workers plus refresh loop.
async fn run(
    config: IngestConfig,
    store: Arc<RecordStore>,
    probe: Arc<dyn Probe>,
    intake: mpsc::Receiver<String>,
    cancel: CancellationToken,
) {
    // The intake queue is only closed by shutdown, so this pool lives as long
    // as the processor.
    let pool = {
        let store = Arc::clone(&store);
        let probe = Arc::clone(&probe);
        WorkerPool::spawn(config.workers, intake, move |url: String| {
            let store = Arc::clone(&store);
            let probe = Arc::clone(&probe);
            async move { validate(&store, probe.as_ref(), &url).await }
        })
    };

    refresh::run_refresh_loop(
        store,
        probe,
        config.refresh_interval(),
        config.workers,
        config.refresh_batch_size,
        cancel,
    )
    .await;

    pool.wait().await;
    info!("ingestion processor stopped");
}

/// Probe `url` once and store it if it responds. Failures are logged and the
/// URL is dropped.
async fn validate(store: &RecordStore, probe: &dyn Probe, url: &str) {
    match probe.run(url).await {
        Ok(result) => {
            store.store(url).await;
            info!(url = url, duration = ?result.duration, "successfully validated and stored URL");
        }
        Err(failure) => {
            warn!(url = url, error = %failure.cause, "failed to validate URL, discarding");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
