use std::sync::Arc;
use std::time::Duration;

use crate::ingest::Processor;
use crate::storage::RecordStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub processor: Arc<Processor>,
    /// Records returned by a listing.
    pub fetch_limit: usize,
    /// Longest a submission may wait for space in the intake queue.
    pub enqueue_timeout: Duration,
}
