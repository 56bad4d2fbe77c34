//! Fixed-size worker pool fanning items out from one shared channel.
//!
//! Each item is handed to exactly one worker. The pool never closes its
//! source: workers exit once every sender has been dropped and the channel is
//! drained, so the producer decides when a pool terminates.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error};

/// A set of workers draining a single work source.
pub struct WorkerPool {
    workers: JoinSet<()>,
}

impl WorkerPool {
    /// Spawn `count` workers reading from `source`, each running `work` on
    /// every item it receives.
    pub fn spawn<T, F, Fut>(count: usize, source: mpsc::Receiver<T>, work: F) -> Self
    where
        T: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let source = Arc::new(Mutex::new(source));
        let work = Arc::new(work);
        let mut workers = JoinSet::new();

        for worker in 0..count {
            let source = Arc::clone(&source);
            let work = Arc::clone(&work);
            workers.spawn(async move {
                loop {
                    // The lock is held only while waiting for the next item.
                    let item = source.lock().await.recv().await;
                    match item {
                        Some(item) => (*work)(item).await,
                        None => break,
                    }
                }
                debug!(worker = worker, "source drained, worker exiting");
            });
        }

        Self { workers }
    }

    /// Wait until every worker has terminated.
    pub async fn wait(mut self) {
        while let Some(joined) = self.workers.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "worker task failed");
            }
        }
    }
}
