use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::client::{PeerClient, PeerError};
use super::protocol::KvResponse;
use crate::config::Config;
use crate::routing::ring::HashRing;
use crate::storage::memory::{MemoryStore, ValueVersion};

/// Client-visible outcome of a coordinated operation.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Key {key} not found")]
    NotFound { key: String },
    #[error("Write quorum not met: {got} < {need}, success nodes: {succeeded:?}")]
    WriteQuorumNotMet {
        got: usize,
        need: usize,
        succeeded: Vec<String>,
    },
    #[error("Read quorum not met: {got} < {need}, success nodes: {succeeded:?}")]
    ReadQuorumNotMet {
        got: usize,
        need: usize,
        succeeded: Vec<String>,
    },
}

/// Turns client operations into quorum-gated replicated operations across
/// the replica set. Generic over the peer client so tests can script the
/// network.
pub struct Coordinator<C: PeerClient> {
    self_url: String,
    ring: Arc<RwLock<HashRing>>,
    store: Arc<MemoryStore>,
    client: C,
    replicas: usize,
    read_quorum: usize,
    write_quorum: usize,
}

impl<C: PeerClient> Coordinator<C> {
    pub fn new(
        config: &Config,
        ring: Arc<RwLock<HashRing>>,
        store: Arc<MemoryStore>,
        client: C,
    ) -> Self {
        Self {
            self_url: config.self_url.clone(),
            ring,
            store,
            client,
            replicas: config.replicas,
            read_quorum: config.read_quorum,
            write_quorum: config.write_quorum,
        }
    }

    /// Coordinates a client write: stamps the version once, replicates it
    /// to every replica in ring order, and gates the response on the write
    /// quorum.
    pub async fn write(&self, key: &str, value: &str) -> Result<KvResponse, CoordinatorError> {
        let targets = self.replica_set(key).await;
        let timestamp = now_ns();
        let version = ValueVersion {
            value: value.to_string(),
            timestamp,
        };

        let mut succeeded = Vec::new();
        for target in &targets {
            if target == &self.self_url {
                self.store.put(key, version.clone());
                succeeded.push(target.clone());
            } else {
                match self.client.forward_write(target, key, value, timestamp).await {
                    Ok(_) => succeeded.push(target.clone()),
                    Err(e) => {
                        warn!("Error forwarding write for {} to {}: {}", key, target, e);
                    }
                }
            }
        }

        if succeeded.len() < self.write_quorum {
            return Err(CoordinatorError::WriteQuorumNotMet {
                got: succeeded.len(),
                need: self.write_quorum,
                succeeded,
            });
        }
        info!(
            "PUT [{} -> {}] to {} nodes: {:?}",
            key,
            value,
            succeeded.len(),
            succeeded
        );
        Ok(KvResponse {
            key: key.to_string(),
            value: value.to_string(),
            timestamp,
        })
    }

    /// Applies a forwarded write locally with the coordinator's timestamp.
    /// A peer that does not propagate one gets a locally-derived stamp.
    pub fn apply_forwarded_write(
        &self,
        key: &str,
        value: &str,
        timestamp: Option<i64>,
    ) -> KvResponse {
        let timestamp = timestamp.unwrap_or_else(now_ns);
        self.store.put(
            key,
            ValueVersion {
                value: value.to_string(),
                timestamp,
            },
        );
        info!("PUT [{} -> {}] from forwarded request", key, value);
        KvResponse {
            key: key.to_string(),
            value: value.to_string(),
            timestamp,
        }
    }

    /// Coordinates a client read: queries every replica in ring order,
    /// keeps the version with the greatest timestamp, and gates the
    /// response on the read quorum.
    ///
    /// A replica answering "absent" (local miss or peer 404) is not a
    /// success, but it is an authoritative answer: when no replica returned
    /// a value and at least a quorum of them reported absence, the key does
    /// not exist and the read is a not-found rather than a quorum failure.
    pub async fn read(&self, key: &str) -> Result<KvResponse, CoordinatorError> {
        let targets = self.replica_set(key).await;

        let mut best: Option<ValueVersion> = None;
        let mut succeeded = Vec::new();
        let mut absent = 0usize;
        for target in &targets {
            let version = if target == &self.self_url {
                match self.store.get(key) {
                    Some(version) => Some(version),
                    None => {
                        absent += 1;
                        None
                    }
                }
            } else {
                match self.client.forward_read(target, key).await {
                    Ok(version) => Some(version),
                    Err(PeerError::NotFound) => {
                        absent += 1;
                        None
                    }
                    Err(e) => {
                        warn!("Error forwarding read for {} to {}: {}", key, target, e);
                        None
                    }
                }
            };

            if let Some(version) = version {
                succeeded.push(target.clone());
                // Strictly greater keeps the first-observed winner on ties.
                if best
                    .as_ref()
                    .map_or(true, |current| version.timestamp > current.timestamp)
                {
                    best = Some(version);
                }
            }
        }

        if succeeded.len() >= self.read_quorum {
            if let Some(version) = best {
                info!(
                    "GET [{} -> {}@{}] from {} nodes: {:?}",
                    key,
                    version.value,
                    version.timestamp,
                    succeeded.len(),
                    succeeded
                );
                return Ok(KvResponse {
                    key: key.to_string(),
                    value: version.value,
                    timestamp: version.timestamp,
                });
            }
        }
        if succeeded.is_empty() && absent >= self.read_quorum {
            return Err(CoordinatorError::NotFound {
                key: key.to_string(),
            });
        }
        Err(CoordinatorError::ReadQuorumNotMet {
            got: succeeded.len(),
            need: self.read_quorum,
            succeeded,
        })
    }

    /// Serves a forwarded read from the local store only.
    pub fn read_local(&self, key: &str) -> Result<KvResponse, CoordinatorError> {
        match self.store.get(key) {
            Some(version) => {
                info!("GET [{} -> {}@{}] local", key, version.value, version.timestamp);
                Ok(KvResponse {
                    key: key.to_string(),
                    value: version.value,
                    timestamp: version.timestamp,
                })
            }
            None => Err(CoordinatorError::NotFound {
                key: key.to_string(),
            }),
        }
    }

    /// Snapshot of the local store for the administrative listing.
    pub fn all(&self) -> HashMap<String, ValueVersion> {
        self.store.all()
    }

    async fn replica_set(&self, key: &str) -> Vec<String> {
        self.ring.read().await.replicas_for(key, self.replicas)
    }
}

fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as i64
}
