use serde::{Deserialize, Serialize};

use crate::crypto::PublicKey;

use super::RegistryEntry;

/// Request to read the current entry for a registry slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRequest {
    /// The slot's key
    pub public_key: PublicKey,
}

/// Request to store a signed entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutRequest {
    pub entry: RegistryEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Request {
    Get(GetRequest),
    Put(PutRequest),
}

/// Response to a get request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetResponse {
    /// The stored entry, if the slot has ever been written
    pub entry: Option<RegistryEntry>,
}

/// Response to a put request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutResponse {
    /// Whether the peer accepted the entry
    pub accepted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Response {
    Get(GetResponse),
    Put(PutResponse),
}
