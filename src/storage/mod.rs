//! In-memory record store -- bounded, ranked tracking of submitted URLs.
//!
//! Records live in a single arena of slots. The key lookup and the
//! age-ordered index both refer to records by slot position, and one
//! `tokio::sync::RwLock` guards all three as a unit.

pub mod record;

pub use self::record::{Record, SortBy, SortError, SortOrder};

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

// ---------------------------------------------------------------------------
// StoreInner
// ---------------------------------------------------------------------------

/// State guarded by the store lock.
struct StoreInner {
    /// Record arena. Slots listed in `free` hold evicted records and are
    /// reused by the next insert.
    slots: Vec<Record>,
    free: Vec<usize>,
    /// Key -> slot.
    lookup: HashMap<String, usize>,
    /// Live slots, most recently upserted first.
    order: Vec<usize>,
}

// ---------------------------------------------------------------------------
// RecordStore
// ---------------------------------------------------------------------------

/// Concurrency-safe store with per-key submission counting.
///
/// Holds at most `capacity` records; inserting a new key into a full store
/// evicts the least recently upserted record.
pub struct RecordStore {
    capacity: usize,
    inner: RwLock<StoreInner>,
}

impl RecordStore {
    /// Create an empty store holding at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: RwLock::new(StoreInner {
                // capacity + 1: an insert overshoots by one before eviction
                slots: Vec::with_capacity(capacity + 1),
                free: Vec::new(),
                lookup: HashMap::with_capacity(capacity + 1),
                order: Vec::with_capacity(capacity + 1),
            }),
        }
    }

    /// Upsert `key`, bumping its submission count and refreshing its
    /// timestamp.
    ///
    /// The ordered index is fully resorted on every call, which is
    /// O(n log n) in the configured capacity.
    pub async fn store(&self, key: &str) {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let slot = match inner.lookup.get(key).copied() {
            Some(slot) => {
                if let Some(pos) = inner.order.iter().position(|&s| s == slot) {
                    inner.order.remove(pos);
                }
                slot
            }
            None => {
                let record = Record::new(key.to_string());
                let slot = match inner.free.pop() {
                    Some(slot) => {
                        inner.slots[slot] = record;
                        slot
                    }
                    None => {
                        inner.slots.push(record);
                        inner.slots.len() - 1
                    }
                };
                inner.lookup.insert(key.to_string(), slot);
                debug!(key = key, slot = slot, "tracking new record");
                slot
            }
        };

        // Front of the index before sorting: the stable sort keeps the
        // touched key ahead of any record with an equal timestamp.
        inner.order.insert(0, slot);

        let record = &mut inner.slots[slot];
        record.submit_count += 1;
        record.last_upserted = Utc::now();

        let slots = &inner.slots;
        inner
            .order
            .sort_by(|a, b| slots[*b].last_upserted.cmp(&slots[*a].last_upserted));

        if inner.order.len() > self.capacity {
            if let Some(evicted) = inner.order.pop() {
                let evicted_key = std::mem::take(&mut inner.slots[evicted].key);
                inner.lookup.remove(&evicted_key);
                inner.free.push(evicted);
                debug!(key = %evicted_key, capacity = self.capacity, "evicted oldest record");
            }
        }
    }

    /// Fetch up to `limit` records (never more than the store capacity),
    /// ranked by `sort_by` in the requested `sort_order`.
    ///
    /// Returned records are copies; the lock is released before sorting.
    pub async fn fetch(&self, limit: usize, sort_by: SortBy, sort_order: SortOrder) -> Vec<Record> {
        let mut records: Vec<Record> = {
            let inner = self.inner.read().await;
            inner
                .order
                .iter()
                .map(|&slot| inner.slots[slot].clone())
                .collect()
        };

        // Age order is the natural order of the index.
        if sort_by == SortBy::Count {
            records.sort_by(|a, b| b.submit_count.cmp(&a.submit_count));
        }

        if sort_order == SortOrder::Ascending {
            records.reverse();
        }

        records.truncate(limit.min(self.capacity));
        records
    }

    /// Number of records currently held.
    pub async fn len(&self) -> usize {
        self.inner.read().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn keys(records: &[Record]) -> Vec<String> {
        records.iter().map(|r| r.key.clone()).collect()
    }

    fn counts(records: &[Record]) -> Vec<u64> {
        records.iter().map(|r| r.submit_count).collect()
    }

    /// Insert url-1..url-10, submitting url-i i times, 10ms apart.
    async fn populated_store(capacity: usize) -> RecordStore {
        let store = RecordStore::new(capacity);
        for i in 1..=10 {
            let key = format!("url-{}", i);
            for _ in 0..i {
                store.store(&key).await;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        store
    }

    async fn assert_consistent(store: &RecordStore) {
        let inner = store.inner.read().await;
        assert_eq!(inner.lookup.len(), inner.order.len());
        assert!(inner.order.len() <= store.capacity);
        assert!(inner.slots.len() <= store.capacity + 1);
        for &slot in &inner.order {
            let key = &inner.slots[slot].key;
            assert_eq!(inner.lookup.get(key), Some(&slot));
        }
    }

    #[tokio::test]
    async fn test_fetch_age_descending_after_eviction() {
        let store = populated_store(5).await;
        let records = store.fetch(5, SortBy::Age, SortOrder::Descending).await;

        // url-1..url-5 have been evicted
        assert_eq!(keys(&records), ["url-10", "url-9", "url-8", "url-7", "url-6"]);
        assert_eq!(counts(&records), [10, 9, 8, 7, 6]);
        assert_consistent(&store).await;
    }

    #[tokio::test]
    async fn test_fetch_age_ascending_after_eviction() {
        let store = populated_store(5).await;
        let records = store.fetch(5, SortBy::Age, SortOrder::Ascending).await;

        assert_eq!(keys(&records), ["url-6", "url-7", "url-8", "url-9", "url-10"]);
        assert_eq!(counts(&records), [6, 7, 8, 9, 10]);
    }

    #[tokio::test]
    async fn test_ascending_is_reverse_of_descending() {
        let store = populated_store(8).await;
        let desc = store.fetch(8, SortBy::Age, SortOrder::Descending).await;
        let mut asc = store.fetch(8, SortBy::Age, SortOrder::Ascending).await;
        asc.reverse();
        assert_eq!(desc, asc);

        for pair in desc.windows(2) {
            assert!(pair[0].last_upserted >= pair[1].last_upserted);
        }
    }

    #[tokio::test]
    async fn test_fetch_by_count() {
        let store = RecordStore::new(10);
        for (key, times) in [("a", 2), ("b", 5), ("c", 1), ("d", 3)] {
            for _ in 0..times {
                store.store(key).await;
            }
        }

        let desc = store.fetch(10, SortBy::Count, SortOrder::Descending).await;
        assert_eq!(keys(&desc), ["b", "d", "a", "c"]);
        for pair in desc.windows(2) {
            assert!(pair[0].submit_count >= pair[1].submit_count);
        }

        let asc = store.fetch(10, SortBy::Count, SortOrder::Ascending).await;
        assert_eq!(counts(&asc), [1, 2, 3, 5]);
    }

    #[tokio::test]
    async fn test_repeated_store_increments_in_place() {
        let store = RecordStore::new(3);
        store.store("same").await;
        let first = store.fetch(3, SortBy::Age, SortOrder::Descending).await;

        for _ in 0..4 {
            store.store("same").await;
        }
        let after = store.fetch(3, SortBy::Age, SortOrder::Descending).await;

        assert_eq!(after.len(), 1);
        assert_eq!(after[0].submit_count, 5);
        assert!(after[0].last_upserted >= first[0].last_upserted);
    }

    #[tokio::test]
    async fn test_keeps_most_recent_keys_only() {
        let store = RecordStore::new(5);
        for i in 1..=20 {
            store.store(&format!("url-{}", i)).await;
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let records = store.fetch(100, SortBy::Age, SortOrder::Descending).await;
        assert_eq!(records.len(), 5);
        assert_eq!(keys(&records), ["url-20", "url-19", "url-18", "url-17", "url-16"]);
        assert_eq!(store.len().await, 5);
        assert_consistent(&store).await;
    }

    #[tokio::test]
    async fn test_resubmitted_key_survives_eviction() {
        let store = RecordStore::new(2);
        store.store("a").await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        store.store("b").await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        // refresh "a" so that "b" becomes the oldest
        store.store("a").await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        store.store("c").await;

        let records = store.fetch(2, SortBy::Age, SortOrder::Descending).await;
        assert_eq!(keys(&records), ["c", "a"]);
        assert_eq!(counts(&records), [1, 2]);
        assert_consistent(&store).await;
    }

    #[tokio::test]
    async fn test_evicted_key_starts_over() {
        let store = RecordStore::new(1);
        store.store("a").await;
        store.store("a").await;
        store.store("b").await;
        store.store("a").await;

        let records = store.fetch(1, SortBy::Age, SortOrder::Descending).await;
        assert_eq!(keys(&records), ["a"]);
        assert_eq!(counts(&records), [1]);
        assert_consistent(&store).await;
    }

    #[tokio::test]
    async fn test_limit_clamped_to_capacity_and_size() {
        let store = RecordStore::new(3);
        assert!(store.fetch(10, SortBy::Age, SortOrder::Descending).await.is_empty());

        store.store("a").await;
        store.store("b").await;
        assert_eq!(store.fetch(10, SortBy::Age, SortOrder::Descending).await.len(), 2);
        assert_eq!(store.fetch(1, SortBy::Age, SortOrder::Descending).await.len(), 1);
        assert_eq!(store.fetch(0, SortBy::Count, SortOrder::Ascending).await.len(), 0);
    }

    #[tokio::test]
    async fn test_fetch_returns_copies() {
        let store = RecordStore::new(3);
        store.store("a").await;

        let mut records = store.fetch(3, SortBy::Age, SortOrder::Descending).await;
        records[0].submit_count = 99;
        records[0].key = "mutated".into();

        let fresh = store.fetch(3, SortBy::Age, SortOrder::Descending).await;
        assert_eq!(fresh[0].key, "a");
        assert_eq!(fresh[0].submit_count, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_store_loses_no_updates() {
        let store = Arc::new(RecordStore::new(10));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                for _ in 0..50 {
                    store.store("shared").await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let records = store.fetch(10, SortBy::Count, SortOrder::Descending).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].submit_count, 400);
    }
}
