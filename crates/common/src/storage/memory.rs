use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::linked_data::{Cid, CidKind};

use super::{ObjectStore, StorageError};

/// An in-process object store.
///
/// Hashes content with BLAKE3 and keeps it in a map keyed by hash. Used by
/// tests in place of a live portal; safe to clone and share across tasks.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<BTreeMap<[u8; 32], Bytes>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch an object by identifier. Lookup is by hash, so a re-tagged
    /// identifier still finds its object.
    pub fn get(&self, cid: &Cid) -> Option<Bytes> {
        self.inner.lock().get(cid.hash()).cloned()
    }

    pub fn contains(&self, cid: &Cid) -> bool {
        self.inner.lock().contains_key(cid.hash())
    }

    /// Number of distinct objects held.
    pub fn object_count(&self) -> usize {
        self.inner.lock().len()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, bytes: Bytes) -> Result<Cid, StorageError> {
        let hash = blake3::hash(&bytes);
        let size = bytes.len() as u64;
        self.inner.lock().insert(*hash.as_bytes(), bytes);
        Ok(Cid::new(CidKind::Raw, *hash.as_bytes(), size))
    }

    async fn put_file(&self, mut file: File, declared_len: u64) -> Result<Cid, StorageError> {
        let mut hasher = blake3::Hasher::new();
        let mut contents = Vec::with_capacity(declared_len as usize);
        let mut chunk = [0u8; 64 * 1024];

        loop {
            let n = file.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            hasher.update(&chunk[..n]);
            contents.extend_from_slice(&chunk[..n]);
        }

        let read = contents.len() as u64;
        if read != declared_len {
            return Err(StorageError::SizeMismatch {
                declared: declared_len,
                read,
            });
        }

        let hash = hasher.finalize();
        self.inner
            .lock()
            .insert(*hash.as_bytes(), Bytes::from(contents));
        Ok(Cid::new(CidKind::Raw, *hash.as_bytes(), read))
    }
}
