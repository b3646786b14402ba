use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use iroh::discovery::pkarr::dht::DhtDiscovery;
use iroh::endpoint::Connection;
use iroh::{Endpoint, NodeId};
use parking_lot::Mutex;

use crate::crypto::{PublicKey, SecretKey};

use super::memory::MemoryRegistry;
use super::messages::{GetRequest, PutRequest, Request, Response};
use super::{Registry, RegistryEntry, RegistryError, REGISTRY_ALPN};

/// Upper bound on a peer's response to a single request
const MAX_RESPONSE_SIZE: usize = 64 * 1024;

/// Pause between rounds of bootstrap connection attempts
const RECONNECT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Default)]
pub struct RegistryNodeBuilder {
    /// the identity of the node, as a SecretKey
    secret_key: Option<SecretKey>,
    /// peers that serve the registry protocol
    bootstrap: Vec<NodeId>,
}

impl RegistryNodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn secret_key(mut self, secret_key: SecretKey) -> Self {
        self.secret_key = Some(secret_key);
        self
    }

    pub fn bootstrap(mut self, peers: Vec<NodeId>) -> Self {
        self.bootstrap = peers;
        self
    }

    pub fn bootstrap_peer(mut self, peer: NodeId) -> Self {
        self.bootstrap.push(peer);
        self
    }

    /// Bind the endpoint and return the node. No peer connections are made
    /// yet; see [`RegistryNode::wait_for_peer`].
    pub async fn spawn(self) -> Result<RegistryNode, RegistryError> {
        // generate an ephemeral identity if none was supplied
        let secret_key = self.secret_key.unwrap_or_else(SecretKey::generate);

        let discovery = DhtDiscovery::builder()
            .secret_key(secret_key.0.clone())
            .build()
            .map_err(|e| anyhow!("failed to build discovery: {}", e))?;

        let endpoint = Endpoint::builder()
            .secret_key(secret_key.0.clone())
            .discovery(discovery)
            .bind()
            .await
            .map_err(|e| anyhow!("failed to bind endpoint: {}", e))?;

        Ok(RegistryNode {
            endpoint,
            bootstrap: self.bootstrap,
            connections: Mutex::new(Vec::new()),
            cache: MemoryRegistry::new(),
        })
    }
}

/// A short-lived peer on the registry network.
///
/// The node's lifetime is scoped to one publish: spawn it, wait for a peer,
/// read and write the registry slot, then [`shutdown`](Self::shutdown) —
/// unconditionally, on the error path too. Entries seen or written pass
/// through an in-process cache that lives and dies with the node.
#[derive(Debug)]
pub struct RegistryNode {
    endpoint: Endpoint,
    bootstrap: Vec<NodeId>,
    connections: Mutex<Vec<Connection>>,
    cache: MemoryRegistry,
}

impl RegistryNode {
    pub fn builder() -> RegistryNodeBuilder {
        RegistryNodeBuilder::new()
    }

    pub fn id(&self) -> NodeId {
        self.endpoint.node_id()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Suspend until at least one bootstrap peer accepts a connection.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoPeers`] when no peer is reachable within
    /// `timeout`, or when the bootstrap list is empty.
    pub async fn wait_for_peer(&self, timeout: Duration) -> Result<(), RegistryError> {
        if self.bootstrap.is_empty() {
            return Err(RegistryError::NoPeers);
        }
        tokio::time::timeout(timeout, self.connect_any())
            .await
            .map_err(|_| RegistryError::NoPeers)?
    }

    async fn connect_any(&self) -> Result<(), RegistryError> {
        loop {
            for node_id in &self.bootstrap {
                match self.endpoint.connect(*node_id, REGISTRY_ALPN).await {
                    Ok(connection) => {
                        tracing::info!("connected to registry peer {}", node_id);
                        self.connections.lock().push(connection);
                        return Ok(());
                    }
                    Err(e) => {
                        tracing::debug!("registry peer {} unreachable: {}", node_id, e);
                    }
                }
            }
            tokio::time::sleep(RECONNECT_INTERVAL).await;
        }
    }

    fn connected(&self) -> Vec<Connection> {
        self.connections.lock().clone()
    }

    /// Send one request over a fresh bidirectional stream and read the
    /// response.
    async fn request(
        connection: &Connection,
        request: &Request,
    ) -> Result<Response, RegistryError> {
        let (mut send, mut recv) = connection
            .open_bi()
            .await
            .map_err(|e| anyhow!("failed to open stream: {}", e))?;

        let request_bytes = bincode::serialize(request)
            .map_err(|e| RegistryError::Wire(format!("failed to serialize request: {}", e)))?;
        send.write_all(&request_bytes)
            .await
            .map_err(|e| anyhow!("failed to write request: {}", e))?;
        send.finish()
            .map_err(|e| anyhow!("failed to finish request: {}", e))?;

        let response_bytes = recv
            .read_to_end(MAX_RESPONSE_SIZE)
            .await
            .map_err(|e| anyhow!("failed to read response: {}", e))?;
        bincode::deserialize(&response_bytes)
            .map_err(|e| RegistryError::Wire(format!("failed to deserialize response: {}", e)))
    }

    /// Release all node resources. Safe to call with requests outstanding;
    /// peers observe a clean close.
    pub async fn shutdown(&self) {
        tracing::debug!("shutting down registry node {}", self.id());
        self.endpoint.close().await;
    }
}

#[async_trait]
impl Registry for RegistryNode {
    /// Read a registry slot from every connected peer and keep the
    /// highest-revision entry that passes signature verification.
    async fn get(&self, public_key: &PublicKey) -> Result<Option<RegistryEntry>, RegistryError> {
        let connections = self.connected();
        if connections.is_empty() {
            return Err(RegistryError::NoPeers);
        }

        let request = Request::Get(GetRequest {
            public_key: *public_key,
        });
        let mut best: Option<RegistryEntry> = None;
        for connection in &connections {
            match Self::request(connection, &request).await {
                Ok(Response::Get(response)) => {
                    if let Some(entry) = response.entry {
                        if !entry.verify() || entry.public_key() != public_key {
                            tracing::warn!("peer returned an invalid registry entry, ignoring");
                            continue;
                        }
                        if best
                            .as_ref()
                            .map(|b| entry.revision() > b.revision())
                            .unwrap_or(true)
                        {
                            best = Some(entry);
                        }
                    }
                }
                Ok(_) => {
                    return Err(RegistryError::Wire(
                        "unexpected response type for get request".to_string(),
                    ))
                }
                Err(e) => {
                    tracing::debug!("registry get failed on one peer: {}", e);
                }
            }
        }

        if let Some(entry) = &best {
            // best-effort; the cache applies its own monotonicity rules
            let _ = self.cache.set(entry.clone()).await;
        }
        Ok(best)
    }

    /// Publish an entry to every connected peer; at least one must accept.
    async fn set(&self, entry: RegistryEntry) -> Result<(), RegistryError> {
        let connections = self.connected();
        if connections.is_empty() {
            return Err(RegistryError::NoPeers);
        }

        let request = Request::Put(PutRequest {
            entry: entry.clone(),
        });
        let mut accepted = 0usize;
        for connection in &connections {
            match Self::request(connection, &request).await {
                Ok(Response::Put(response)) if response.accepted => accepted += 1,
                Ok(Response::Put(_)) => {
                    tracing::warn!("registry peer refused entry");
                }
                Ok(_) => {
                    return Err(RegistryError::Wire(
                        "unexpected response type for put request".to_string(),
                    ))
                }
                Err(e) => {
                    tracing::debug!("registry put failed on one peer: {}", e);
                }
            }
        }

        if accepted == 0 {
            return Err(RegistryError::PublishRejected);
        }
        let _ = self.cache.set(entry).await;
        Ok(())
    }
}
