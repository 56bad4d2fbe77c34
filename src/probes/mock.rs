//! In-process probes for tests. No network involved.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use tokio::sync::{mpsc, Semaphore};

use super::{Probe, ProbeError, ProbeFailure, ScrapeResult};

/// A probe that succeeds for every URL except those marked failing.
///
/// Optionally reports each URL it starts on, and optionally waits for a
/// permit from a gate before answering, so tests can hold workers busy.
#[derive(Default)]
pub struct MockProbe {
    failing: HashSet<String>,
    calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
    started: Option<mpsc::UnboundedSender<String>>,
}

impl MockProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with a `503` failure.
    pub fn failing_on(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    /// Consume one permit from `gate` before answering each call.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Send every URL to `tx` as soon as a call starts.
    pub fn notify_started(mut self, tx: mpsc::UnboundedSender<String>) -> Self {
        self.started = Some(tx);
        self
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Probe for MockProbe {
    async fn run(&self, url: &str) -> Result<ScrapeResult, ProbeFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(tx) = &self.started {
            let _ = tx.send(url.to_string());
        }

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        if self.failing.contains(url) {
            return Err(ProbeFailure {
                result: ScrapeResult::failure(url, Duration::ZERO),
                cause: ProbeError::UnexpectedStatus(StatusCode::SERVICE_UNAVAILABLE),
            });
        }

        Ok(ScrapeResult::success(url, Duration::from_millis(1)))
    }
}
