//! Shared test utilities for publish integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tempfile::TempDir;
use tokio::fs::File;

use common::linked_data::Cid;
use common::storage::{MemoryStore, ObjectStore, StorageError};

/// Opt into test logs with RUST_LOG.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Create a temp directory populated with the given (path, contents) pairs.
pub fn temp_tree(files: &[(&str, &[u8])]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (path, contents) in files {
        let full = dir.path().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, contents).unwrap();
    }
    dir
}

/// Store wrapper that records how many file uploads are in flight at once.
#[derive(Clone, Default)]
pub struct GaugeStore {
    inner: MemoryStore,
    in_flight: Arc<AtomicUsize>,
    high_water: Arc<AtomicUsize>,
}

impl GaugeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most uploads ever observed in flight simultaneously.
    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for GaugeStore {
    async fn put(&self, bytes: Bytes) -> Result<Cid, StorageError> {
        self.inner.put(bytes).await
    }

    async fn put_file(&self, file: File, declared_len: u64) -> Result<Cid, StorageError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);

        // Hold the slot long enough for siblings to pile up
        tokio::time::sleep(Duration::from_millis(10)).await;
        let result = self.inner.put_file(file, declared_len).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Store wrapper that rejects any file upload of exactly `poison_len`
/// bytes.
#[derive(Clone)]
pub struct FailingStore {
    inner: MemoryStore,
    poison_len: u64,
}

impl FailingStore {
    pub fn new(poison_len: u64) -> Self {
        Self {
            inner: MemoryStore::new(),
            poison_len,
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

#[async_trait]
impl ObjectStore for FailingStore {
    async fn put(&self, bytes: Bytes) -> Result<Cid, StorageError> {
        self.inner.put(bytes).await
    }

    async fn put_file(&self, file: File, declared_len: u64) -> Result<Cid, StorageError> {
        if declared_len == self.poison_len {
            return Err(StorageError::Rejected {
                status: 500,
                message: "upload refused".to_string(),
            });
        }
        self.inner.put_file(file, declared_len).await
    }
}
