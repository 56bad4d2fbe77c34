//! Periodic benchmark refresh of the most recently touched URLs.
//!
//! Each cycle fans the top records out to a fresh, short-lived
//! [`WorkerPool`], collects one [`ScrapeResult`] per URL, and logs the
//! resulting [`ScrapeSummary`]. URLs that still respond are stored again,
//! which refreshes their timestamp.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::pool::WorkerPool;
use super::report::{format_summary, summary_json, ScrapeSummary};
use crate::probes::{Probe, ScrapeResult};
use crate::storage::{RecordStore, SortBy, SortOrder};

/// Run refresh cycles every `period` until `cancel` fires.
///
/// The first cycle starts one full period after the loop. A cycle that is
/// already running when `cancel` fires is allowed to finish.
pub async fn run_refresh_loop(
    store: Arc<RecordStore>,
    probe: Arc<dyn Probe>,
    period: Duration,
    workers: usize,
    batch_size: usize,
    cancel: CancellationToken,
) {
    info!(period_sec = period.as_secs(), batch_size = batch_size, "benchmark refresh loop started");

    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                debug!("triggering URL benchmark refresh");
                refresh_benchmarks(&store, &probe, workers, batch_size).await;
            }
        }
    }

    info!("benchmark refresh loop stopped");
}

/// Re-benchmark the `batch_size` most recently upserted URLs using
/// `workers` concurrent workers.
pub async fn refresh_benchmarks(
    store: &Arc<RecordStore>,
    probe: &Arc<dyn Probe>,
    workers: usize,
    batch_size: usize,
) -> ScrapeSummary {
    let cycle_id = Uuid::new_v4();

    let records = store.fetch(batch_size, SortBy::Age, SortOrder::Descending).await;
    if records.is_empty() {
        debug!(%cycle_id, "no stored URLs to refresh");
        return ScrapeSummary::default();
    }
    let batch = records.len();

    // Pre-load every key, then close the source so the pool terminates once
    // it has drained.
    let (keys_tx, keys_rx) = mpsc::channel(batch);
    for record in records {
        if keys_tx.send(record.key).await.is_err() {
            break;
        }
    }
    drop(keys_tx);

    // Sized to the batch: one result per key, so workers never wait on it.
    let (results_tx, mut results_rx) = mpsc::channel::<ScrapeResult>(batch);

    let pool = {
        let store = Arc::clone(store);
        let probe = Arc::clone(probe);
        WorkerPool::spawn(workers, keys_rx, move |url: String| {
            let store = Arc::clone(&store);
            let probe = Arc::clone(&probe);
            let results_tx = results_tx.clone();
            async move {
                let result = match probe.run(&url).await {
                    Ok(result) => {
                        store.store(&url).await;
                        info!(%cycle_id, url = %url, duration = ?result.duration, "successfully benchmarked URL");
                        result
                    }
                    Err(failure) => {
                        warn!(%cycle_id, url = %url, error = %failure.cause, "failed to benchmark URL");
                        failure.result
                    }
                };
                if results_tx.send(result).await.is_err() {
                    debug!(%cycle_id, url = %url, "result sink closed, dropping result");
                }
            }
        })
    };
    pool.wait().await;

    // Fan results back in.
    results_rx.close();
    let mut summary = ScrapeSummary::default();
    while let Some(result) = results_rx.recv().await {
        summary.push(result);
    }

    info!(
        %cycle_id,
        success_count = summary.success_count,
        failure_count = summary.failure_count,
        summary = %format_summary(&summary),
        summary_json = %summary_json(&summary),
        "refreshed URL benchmarks"
    );

    summary
}
