/**
 * Cryptographic types and operations.
 *  - Public and Private key implementations
 *  - Mnemonic seed -> keypair derivation
 */
pub mod crypto;
/**
 * Content identifiers and block encoding.
 * Wraps the network's typed, size-carrying identifier
 *  format and our DAG-CBOR block codec.
 */
pub mod linked_data;
/**
 * The web app manifest: a mapping of relative paths
 *  to their content identifiers, plus routing hints.
 * Represents a published directory at a given version.
 */
pub mod metadata;
/**
 * The publish pipeline: tree walking, bounded-parallel
 *  uploads, manifest assembly and publication.
 */
pub mod publish;
/**
 * Signed, revision-numbered registry entries and the
 *  peer-to-peer client used to publish them.
 */
pub mod registry;
/**
 * Storage backends. The portal client speaks the
 *  upload HTTP API; the memory store backs tests.
 */
pub mod storage;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::crypto::{PublicKey, SecretKey};
    pub use crate::linked_data::{multibase, BlockEncoded, Cid, CidError, CidKind};
    pub use crate::metadata::{PathContent, WebAppMetadata};
    pub use crate::publish::{PublishError, Publisher};
    pub use crate::registry::{Registry, RegistryEntry, RegistryError};
    pub use crate::storage::ObjectStore;
}
