use ipld_core::codec::Codec;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use serde_ipld_dagcbor::codec::DagCborCodec;

/// Errors that can occur while encoding or decoding blocks
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("encode error: {0}")]
    Encode(String),
    #[error("decode error: {0}")]
    Decode(String),
}

/// A type that round-trips through our block encoding (DAG-CBOR).
///
/// Blocks are stored and addressed by the hash of their encoded bytes, so
/// encoding must be deterministic: map-like structures use `BTreeMap` and
/// struct fields serialize in declaration order.
pub trait BlockEncoded: Serialize + DeserializeOwned {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        DagCborCodec::encode_to_vec(self).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        DagCborCodec::decode_from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}
