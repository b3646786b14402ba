//! Storage backends
//!
//! The publish pipeline only needs two operations from a backend: upload an
//! in-memory object, and upload an open file by streaming it. Everything
//! else about the storage network (chunking, replication, hashing on the
//! server side) is its own business.

mod memory;
mod portal;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs::File;

use crate::linked_data::{Cid, CidError};

pub use memory::MemoryStore;
pub use portal::PortalClient;

/// Errors surfaced by a storage backend
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid portal url: {0}")]
    Url(#[from] url::ParseError),
    #[error("upload rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("portal session not established: {0}")]
    Auth(String),
    #[error("backend returned an invalid identifier: {0}")]
    InvalidCid(#[from] CidError),
    #[error("size mismatch: declared {declared}, read {read}")]
    SizeMismatch { declared: u64, read: u64 },
    #[error("storage error: {0}")]
    Default(#[from] anyhow::Error),
}

/// An object storage backend addressed by content.
///
/// Implementations return the identifier the network assigned to the
/// uploaded bytes; callers re-tag it as needed.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload an in-memory object.
    async fn put(&self, bytes: Bytes) -> Result<Cid, StorageError>;

    /// Upload an open file by streaming its contents together with the
    /// declared byte length. Implementations must not buffer the whole
    /// file in memory.
    async fn put_file(&self, file: File, declared_len: u64) -> Result<Cid, StorageError>;
}
