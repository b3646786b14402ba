use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::crypto::PublicKey;

use super::{Registry, RegistryEntry, RegistryError};

/// A process-local registry keyed by hex public key.
///
/// Applies the same acceptance rules a registry service does: entries must
/// carry a valid signature and a strictly higher revision than whatever is
/// already stored. The node uses one as its local cache; tests use it as
/// the service itself.
#[derive(Clone, Debug, Default)]
pub struct MemoryRegistry {
    inner: Arc<Mutex<BTreeMap<String, RegistryEntry>>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry_count(&self) -> usize {
        self.inner.lock().len()
    }
}

#[async_trait]
impl Registry for MemoryRegistry {
    async fn get(&self, public_key: &PublicKey) -> Result<Option<RegistryEntry>, RegistryError> {
        Ok(self.inner.lock().get(&public_key.to_hex()).cloned())
    }

    async fn set(&self, entry: RegistryEntry) -> Result<(), RegistryError> {
        if !entry.verify() {
            return Err(RegistryError::BadSignature);
        }

        let mut entries = self.inner.lock();
        let key = entry.public_key().to_hex();
        if let Some(current) = entries.get(&key) {
            if entry.revision() <= current.revision() {
                return Err(RegistryError::StaleRevision {
                    attempted: entry.revision(),
                    current: current.revision(),
                });
            }
        }
        entries.insert(key, entry);
        Ok(())
    }
}
