//! In-memory remote store for fast, deterministic tests
//!
//! [`InMemoryRemoteStore`] implements [`RemoteStore`] over nested maps and
//! lets tests inject failures and count calls:
//!
//! - sequential, sortable keys (`key-0000000001`, `key-0000000002`, ...)
//! - per-operation failure injection, permanent or for the next `n` calls
//! - a switch that makes `generate_key` hand out empty keys
//! - call counters for writes, removes, fetches and generated keys

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only happens after a test already panicked

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use synced_todo_core::remote::{
    RemoteFuture, RemoteStore, RemoteStoreError, Snapshot, validate_key,
};

/// A failure to inject into one kind of operation.
#[derive(Debug, Clone)]
struct Injected {
    error: RemoteStoreError,
    /// `None` fails forever, `Some(n)` fails the next `n` calls.
    remaining: Option<usize>,
}

impl Injected {
    /// Consume one failure, if any is armed.
    fn take(slot: &mut Option<Self>) -> Option<RemoteStoreError> {
        let injected = slot.as_mut()?;
        let error = injected.error.clone();
        if let Some(n) = injected.remaining.as_mut() {
            *n = n.saturating_sub(1);
            if *n == 0 {
                *slot = None;
            }
        }
        Some(error)
    }
}

#[derive(Debug, Default)]
struct Failures {
    writes: Option<Injected>,
    removes: Option<Injected>,
    reads: Option<Injected>,
    empty_keys: bool,
}

#[derive(Debug, Default)]
struct Counters {
    writes: AtomicUsize,
    removes: AtomicUsize,
    fetches: AtomicUsize,
    keys: AtomicUsize,
}

/// In-memory [`RemoteStore`] with failure injection.
///
/// Cloning shares the underlying data, failures and counters, so a test can
/// keep a handle while the code under test owns an `Arc<dyn RemoteStore>`.
///
/// # Example
///
/// ```
/// use synced_todo_testing::InMemoryRemoteStore;
/// use synced_todo_core::remote::{RemoteStore, RemoteStoreError};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), RemoteStoreError> {
/// let store = InMemoryRemoteStore::new();
/// let key = store.generate_key("todos")?;
/// store.write("todos".into(), key.clone(), json!({"todo": "buy milk"})).await?;
///
/// assert_eq!(store.write_count(), 1);
/// assert!(store.get("todos", &key).is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryRemoteStore {
    data: Arc<RwLock<BTreeMap<String, Snapshot>>>,
    failures: Arc<RwLock<Failures>>,
    counters: Arc<Counters>,
}

impl InMemoryRemoteStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry before the test starts (no counters touched)
    #[must_use]
    pub fn with_entry(self, collection: &str, key: &str, value: Value) -> Self {
        self.data
            .write()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), value);
        self
    }

    /// Fail every write with `error`
    pub fn fail_writes(&self, error: RemoteStoreError) {
        self.failures.write().unwrap().writes = Some(Injected {
            error,
            remaining: None,
        });
    }

    /// Fail the next `times` writes with `error`, then succeed
    pub fn fail_next_writes(&self, times: usize, error: RemoteStoreError) {
        self.failures.write().unwrap().writes = (times > 0).then_some(Injected {
            error,
            remaining: Some(times),
        });
    }

    /// Fail every remove with `error`
    pub fn fail_removes(&self, error: RemoteStoreError) {
        self.failures.write().unwrap().removes = Some(Injected {
            error,
            remaining: None,
        });
    }

    /// Fail every fetch with `error`
    pub fn fail_reads(&self, error: RemoteStoreError) {
        self.failures.write().unwrap().reads = Some(Injected {
            error,
            remaining: None,
        });
    }

    /// Make `generate_key` return empty strings (simulates a missing key)
    pub fn generate_empty_keys(&self, enabled: bool) {
        self.failures.write().unwrap().empty_keys = enabled;
    }

    /// Remove all injected failures
    pub fn heal(&self) {
        *self.failures.write().unwrap() = Failures::default();
    }

    /// Current contents of `collection`, `None` if it has no entries
    #[must_use]
    pub fn snapshot(&self, collection: &str) -> Option<Snapshot> {
        self.data
            .read()
            .unwrap()
            .get(collection)
            .filter(|entries| !entries.is_empty())
            .cloned()
    }

    /// Value stored at `collection/key`
    #[must_use]
    pub fn get(&self, collection: &str, key: &str) -> Option<Value> {
        self.data
            .read()
            .unwrap()
            .get(collection)
            .and_then(|entries| entries.get(key))
            .cloned()
    }

    /// Number of entries in `collection`
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.data
            .read()
            .unwrap()
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Number of `write` calls, failed ones included
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.counters.writes.load(Ordering::SeqCst)
    }

    /// Number of `remove` calls, failed ones included
    #[must_use]
    pub fn remove_count(&self) -> usize {
        self.counters.removes.load(Ordering::SeqCst)
    }

    /// Number of `fetch_all_once` calls, failed ones included
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.counters.fetches.load(Ordering::SeqCst)
    }

    /// Number of keys handed out by `generate_key`
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.counters.keys.load(Ordering::SeqCst)
    }
}

impl RemoteStore for InMemoryRemoteStore {
    fn generate_key(&self, collection: &str) -> Result<String, RemoteStoreError> {
        validate_key(collection)?;
        let n = self.counters.keys.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failures.read().unwrap().empty_keys {
            return Ok(String::new());
        }
        Ok(format!("key-{n:010}"))
    }

    fn write(&self, collection: String, key: String, value: Value) -> RemoteFuture<'_, ()> {
        Box::pin(async move {
            self.counters.writes.fetch_add(1, Ordering::SeqCst);
            validate_key(&collection)?;
            validate_key(&key)?;
            if let Some(error) = Injected::take(&mut self.failures.write().unwrap().writes) {
                return Err(error);
            }

            self.data
                .write()
                .unwrap()
                .entry(collection)
                .or_default()
                .insert(key, value);
            Ok(())
        })
    }

    fn remove(&self, collection: String, key: String) -> RemoteFuture<'_, ()> {
        Box::pin(async move {
            self.counters.removes.fetch_add(1, Ordering::SeqCst);
            validate_key(&collection)?;
            validate_key(&key)?;
            if let Some(error) = Injected::take(&mut self.failures.write().unwrap().removes) {
                return Err(error);
            }

            if let Some(entries) = self.data.write().unwrap().get_mut(&collection) {
                entries.remove(&key);
            }
            Ok(())
        })
    }

    fn fetch_all_once(&self, collection: String) -> RemoteFuture<'_, Option<Snapshot>> {
        Box::pin(async move {
            self.counters.fetches.fetch_add(1, Ordering::SeqCst);
            validate_key(&collection)?;
            if let Some(error) = Injected::take(&mut self.failures.write().unwrap().reads) {
                return Err(error);
            }
            Ok(self.snapshot(&collection))
        })
    }
}
