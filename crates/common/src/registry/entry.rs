use serde::{Deserialize, Serialize};

use crate::crypto::{PublicKey, SecretKey};

/// Marker byte prefixing every signed entry payload
const ENTRY_PREFIX: u8 = 0x07;

/// A signed, revision-numbered record binding a public key to a small data
/// payload.
///
/// Entries are immutable once signed. Updating a registry slot means
/// constructing a new entry with a strictly higher revision and publishing
/// it; the network keeps whichever valid entry has the highest revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    public_key: PublicKey,
    data: Vec<u8>,
    revision: u64,
    signature: ed25519_dalek::Signature,
}

impl RegistryEntry {
    /// Construct and sign an entry. `data` must fit in 255 bytes.
    pub fn sign(key: &SecretKey, data: Vec<u8>, revision: u64) -> Self {
        assert!(data.len() <= u8::MAX as usize, "entry data too large");
        let signature = key.sign(&signing_payload(revision, &data));
        Self {
            public_key: key.public(),
            data,
            revision,
            signature,
        }
    }

    /// Check the signature against the entry's own public key.
    pub fn verify(&self) -> bool {
        self.data.len() <= u8::MAX as usize
            && self
                .public_key
                .verify(&signing_payload(self.revision, &self.data), &self.signature)
                .is_ok()
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn signature(&self) -> &ed25519_dalek::Signature {
        &self.signature
    }

    /// Swap the data payload without re-signing. Test helper for building
    /// entries whose signature no longer matches.
    #[cfg(test)]
    pub(crate) fn with_unsigned_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }
}

/// The byte sequence an entry signature covers: prefix, revision, data
/// length, data.
fn signing_payload(revision: u64, data: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(10 + data.len());
    payload.push(ENTRY_PREFIX);
    payload.extend_from_slice(&revision.to_le_bytes());
    payload.push(data.len() as u8);
    payload.extend_from_slice(data);
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let key = SecretKey::generate();
        let entry = RegistryEntry::sign(&key, vec![1, 2, 3], 0);

        assert!(entry.verify());
        assert_eq!(entry.public_key(), &key.public());
        assert_eq!(entry.revision(), 0);
        assert_eq!(entry.data(), &[1, 2, 3]);
    }

    #[test]
    fn test_tampered_entry_fails_verification() {
        let key = SecretKey::generate();
        let entry = RegistryEntry::sign(&key, vec![1, 2, 3], 7);

        let mut tampered = entry.clone();
        tampered.data = vec![3, 2, 1];
        assert!(!tampered.verify());

        let mut bumped = entry.clone();
        bumped.revision = 8;
        assert!(!bumped.verify());

        let mut stolen = entry;
        stolen.public_key = SecretKey::generate().public();
        assert!(!stolen.verify());
    }

    #[test]
    fn test_distinct_revisions_sign_differently() {
        let key = SecretKey::generate();
        let a = RegistryEntry::sign(&key, vec![9], 0);
        let b = RegistryEntry::sign(&key, vec![9], 1);
        assert_ne!(a.signature(), b.signature());
    }
}
