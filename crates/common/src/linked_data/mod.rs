//! Content identifiers and block encoding
//!
//! Everything the network addresses is identified by a [`Cid`]: a type tag,
//! a BLAKE3 hash, and the byte size of the identified object. Structured
//! blocks (the web app manifest) are DAG-CBOR encoded via [`BlockEncoded`].

mod cid;
mod codec;

pub use multibase;

pub use cid::{Cid, CidError, CidKind, ALGORITHM_ED25519, HASH_BLAKE3};
pub use codec::{BlockEncoded, CodecError, DagCborCodec};
