use std::fmt;
use std::str::FromStr;

use multibase::Base;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::PublicKey;

/// Size of the hash payload in bytes
pub const HASH_SIZE: usize = 32;

/// Marker byte for a BLAKE3 hash payload
pub const HASH_BLAKE3: u8 = 0x1f;
/// Marker byte for an Ed25519 public key payload (resolver identifiers)
pub const ALGORITHM_ED25519: u8 = 0xed;

/// Errors that can occur while encoding or decoding identifiers
#[derive(Debug, thiserror::Error)]
pub enum CidError {
    #[error("unknown identifier type: {0:#04x}")]
    UnknownKind(u8),
    #[error("unsupported hash marker: {0:#04x}")]
    UnsupportedHash(u8),
    #[error("unsupported key algorithm: {0:#04x}")]
    UnsupportedAlgorithm(u8),
    #[error("identifier too short: {0} bytes")]
    TooShort(usize),
    #[error("invalid size field: {0} bytes")]
    InvalidSize(usize),
    #[error("multibase decode error: {0}")]
    Multibase(#[from] multibase::Error),
}

/// The type tag of an identifier.
///
/// Two identifiers with the same hash and size but different kinds are
/// distinct values; [`Cid::with_kind`] converts between the blob-typed
/// variants without touching the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CidKind {
    /// A raw blob of bytes
    Raw,
    /// A DAG-CBOR encoded web app manifest
    MetadataWebApp,
    /// An indirect pointer resolved through the registry;
    /// the payload is a public key, not a content hash
    Resolver,
}

impl CidKind {
    pub fn as_byte(&self) -> u8 {
        match self {
            CidKind::Raw => 0x26,
            CidKind::MetadataWebApp => 0x59,
            CidKind::Resolver => 0x25,
        }
    }

    pub fn from_byte(byte: u8) -> Result<Self, CidError> {
        match byte {
            0x26 => Ok(CidKind::Raw),
            0x59 => Ok(CidKind::MetadataWebApp),
            0x25 => Ok(CidKind::Resolver),
            other => Err(CidError::UnknownKind(other)),
        }
    }
}

/// A typed content identifier: kind + BLAKE3 hash + object size.
///
/// Wire layout for blob kinds:
///
/// ```text
/// [kind, 0x1f, hash[32], size as little-endian, trailing zeros trimmed]
/// ```
///
/// Resolver identifiers carry a public key where the hash would be and no
/// size: `[0x25, 0xed, public_key[32]]`.
///
/// The textual form is multibase base58btc (`z...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cid {
    kind: CidKind,
    hash: [u8; HASH_SIZE],
    size: u64,
}

impl Cid {
    pub fn new(kind: CidKind, hash: [u8; HASH_SIZE], size: u64) -> Self {
        Self { kind, hash, size }
    }

    /// Build a resolver identifier for a public key.
    pub fn resolver(public_key: &PublicKey) -> Self {
        Self {
            kind: CidKind::Resolver,
            hash: public_key.to_bytes(),
            size: 0,
        }
    }

    pub fn kind(&self) -> CidKind {
        self.kind
    }

    /// The 32-byte payload: a BLAKE3 hash for blob kinds, a public key
    /// for resolvers.
    pub fn hash(&self) -> &[u8; HASH_SIZE] {
        &self.hash
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Re-tag this identifier, keeping hash and size.
    pub fn with_kind(&self, kind: CidKind) -> Self {
        Self { kind, ..*self }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2 + HASH_SIZE + 8);
        bytes.push(self.kind.as_byte());
        match self.kind {
            CidKind::Resolver => {
                bytes.push(ALGORITHM_ED25519);
                bytes.extend_from_slice(&self.hash);
            }
            _ => {
                bytes.push(HASH_BLAKE3);
                bytes.extend_from_slice(&self.hash);
                let le = self.size.to_le_bytes();
                let len = 8 - le.iter().rev().take_while(|b| **b == 0).count();
                bytes.extend_from_slice(&le[..len.max(1)]);
            }
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CidError> {
        if bytes.len() < 2 + HASH_SIZE {
            return Err(CidError::TooShort(bytes.len()));
        }
        let kind = CidKind::from_byte(bytes[0])?;
        let mut hash = [0u8; HASH_SIZE];
        hash.copy_from_slice(&bytes[2..2 + HASH_SIZE]);
        match kind {
            CidKind::Resolver => {
                if bytes[1] != ALGORITHM_ED25519 {
                    return Err(CidError::UnsupportedAlgorithm(bytes[1]));
                }
                Ok(Self {
                    kind,
                    hash,
                    size: 0,
                })
            }
            _ => {
                if bytes[1] != HASH_BLAKE3 {
                    return Err(CidError::UnsupportedHash(bytes[1]));
                }
                let size_bytes = &bytes[2 + HASH_SIZE..];
                if size_bytes.is_empty() || size_bytes.len() > 8 {
                    return Err(CidError::InvalidSize(size_bytes.len()));
                }
                let mut le = [0u8; 8];
                le[..size_bytes.len()].copy_from_slice(size_bytes);
                Ok(Self {
                    kind,
                    hash,
                    size: u64::from_le_bytes(le),
                })
            }
        }
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", multibase::encode(Base::Base58Btc, self.to_bytes()))
    }
}

impl FromStr for Cid {
    type Err = CidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, bytes) = multibase::decode(s)?;
        Self::from_bytes(&bytes)
    }
}

impl TryFrom<&str> for Cid {
    type Error = CidError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl Serialize for Cid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.to_bytes())
    }
}

struct CidVisitor;

impl<'de> Visitor<'de> for CidVisitor {
    type Value = Cid;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a byte-string content identifier")
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Cid::from_bytes(v).map_err(de::Error::custom)
    }

    fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        self.visit_bytes(&v)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: de::SeqAccess<'de>,
    {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(byte) = seq.next_element::<u8>()? {
            bytes.push(byte);
        }
        Cid::from_bytes(&bytes).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for Cid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_bytes(CidVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_hash() -> [u8; HASH_SIZE] {
        let mut hash = [0u8; HASH_SIZE];
        for (i, byte) in hash.iter_mut().enumerate() {
            *byte = i as u8;
        }
        hash
    }

    #[test]
    fn test_bytes_roundtrip() {
        let cid = Cid::new(CidKind::Raw, test_hash(), 1_234_567);
        let decoded = Cid::from_bytes(&cid.to_bytes()).unwrap();
        assert_eq!(cid, decoded);
    }

    #[test]
    fn test_string_roundtrip() {
        let cid = Cid::new(CidKind::MetadataWebApp, test_hash(), 42);
        let s = cid.to_string();
        assert!(s.starts_with('z'));
        let parsed: Cid = s.parse().unwrap();
        assert_eq!(cid, parsed);
    }

    #[test]
    fn test_retag_preserves_hash_and_size() {
        let raw = Cid::new(CidKind::Raw, test_hash(), 512);
        let webapp = raw.with_kind(CidKind::MetadataWebApp);
        assert_eq!(webapp.kind(), CidKind::MetadataWebApp);
        assert_eq!(webapp.hash(), raw.hash());
        assert_eq!(webapp.size(), raw.size());
        assert_ne!(webapp, raw);

        let back = webapp.with_kind(CidKind::Raw);
        assert_eq!(back, raw);
    }

    #[test]
    fn test_size_trimming() {
        // A one-byte size encodes to exactly one trailing byte
        let small = Cid::new(CidKind::Raw, test_hash(), 5);
        assert_eq!(small.to_bytes().len(), 2 + HASH_SIZE + 1);

        // A zero size still carries one byte
        let empty = Cid::new(CidKind::Raw, test_hash(), 0);
        assert_eq!(empty.to_bytes().len(), 2 + HASH_SIZE + 1);
        assert_eq!(Cid::from_bytes(&empty.to_bytes()).unwrap().size(), 0);

        // Max size takes all eight
        let max = Cid::new(CidKind::Raw, test_hash(), u64::MAX);
        assert_eq!(max.to_bytes().len(), 2 + HASH_SIZE + 8);
        assert_eq!(Cid::from_bytes(&max.to_bytes()).unwrap().size(), u64::MAX);
    }

    #[test]
    fn test_resolver_encoding() {
        let key = crate::crypto::SecretKey::generate().public();
        let cid = Cid::resolver(&key);
        let bytes = cid.to_bytes();
        assert_eq!(bytes[0], CidKind::Resolver.as_byte());
        assert_eq!(bytes[1], ALGORITHM_ED25519);
        assert_eq!(&bytes[2..], key.to_bytes().as_slice());

        let decoded = Cid::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, cid);
    }

    #[test]
    fn test_rejects_unknown_kind() {
        let mut bytes = Cid::new(CidKind::Raw, test_hash(), 1).to_bytes();
        bytes[0] = 0x99;
        assert!(matches!(
            Cid::from_bytes(&bytes),
            Err(CidError::UnknownKind(0x99))
        ));
    }

    #[test]
    fn test_rejects_truncated() {
        let bytes = Cid::new(CidKind::Raw, test_hash(), 1).to_bytes();
        assert!(Cid::from_bytes(&bytes[..10]).is_err());
    }

    #[test]
    fn test_cbor_serde_roundtrip() {
        use crate::linked_data::BlockEncoded;

        #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Wrapper {
            cid: Cid,
        }
        impl BlockEncoded for Wrapper {}

        let wrapper = Wrapper {
            cid: Cid::new(CidKind::Raw, test_hash(), 77),
        };
        let encoded = wrapper.encode().unwrap();
        let decoded = Wrapper::decode(&encoded).unwrap();
        assert_eq!(wrapper, decoded);
    }
}
