//! # Registry
//!
//! The registry gives an immutable content hash a stable, updatable name:
//! a signed [`RegistryEntry`] binds a public key to a small payload (here,
//! a pointer at a web app manifest) under a monotonically increasing
//! revision. Republishing with `revision + 1` moves the pointer; the
//! resolver identifier derived from the public key never changes.

mod entry;
mod memory;
mod messages;
mod node;

use async_trait::async_trait;

use crate::crypto::{PublicKey, SecretKey};
use crate::linked_data::{Cid, CidKind, HASH_BLAKE3};

pub use entry::RegistryEntry;
pub use memory::MemoryRegistry;
pub use messages::{GetRequest, GetResponse, PutRequest, PutResponse, Request, Response};
pub use node::{RegistryNode, RegistryNodeBuilder};

/// ALPN identifying the registry protocol
pub const REGISTRY_ALPN: &[u8] = b"/quay/registry/0";

/// First byte of entry data whose payload is a content identifier pointer
pub const DATA_TYPE_CID: u8 = 0x5a;

/// Errors that can occur while talking to the registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no peers reachable")]
    NoPeers,
    #[error("entry signature rejected")]
    BadSignature,
    #[error("stale revision: {attempted} does not exceed {current}")]
    StaleRevision { attempted: u64, current: u64 },
    #[error("publish rejected by all peers")]
    PublishRejected,
    #[error("wire error: {0}")]
    Wire(String),
    #[error("registry error: {0}")]
    Default(#[from] anyhow::Error),
}

/// A key/value view of the registry: read a slot, write a signed entry.
#[async_trait]
pub trait Registry: Send + Sync {
    async fn get(&self, public_key: &PublicKey) -> Result<Option<RegistryEntry>, RegistryError>;
    async fn set(&self, entry: RegistryEntry) -> Result<(), RegistryError>;
}

/// Entry payload pointing at a web app manifest: a three-byte marker
/// (CID pointer, resolver-typed, BLAKE3-hashed) followed by the raw
/// manifest hash.
pub fn resolver_payload(manifest_cid: &Cid) -> Vec<u8> {
    let mut data = Vec::with_capacity(3 + manifest_cid.hash().len());
    data.push(DATA_TYPE_CID);
    data.push(CidKind::Resolver.as_byte());
    data.push(HASH_BLAKE3);
    data.extend_from_slice(manifest_cid.hash());
    data
}

/// Point a registry slot at a manifest.
///
/// Reads the slot's current revision (absent means the first entry is
/// revision 0), signs a new entry one revision higher, publishes it, and
/// returns the stable resolver identifier for the slot.
pub async fn publish_resolver<R: Registry + ?Sized>(
    registry: &R,
    key: &SecretKey,
    manifest_cid: &Cid,
) -> Result<Cid, RegistryError> {
    let public_key = key.public();
    let revision = match registry.get(&public_key).await? {
        Some(current) => current.revision() + 1,
        None => 0,
    };

    let entry = RegistryEntry::sign(key, resolver_payload(manifest_cid), revision);
    tracing::info!(
        "publishing registry entry for {} at revision {}",
        public_key.to_hex(),
        revision
    );
    registry.set(entry).await?;

    Ok(Cid::resolver(&public_key))
}
