//! Node Configuration
//!
//! Loads the node's identity and cluster parameters from the environment.
//! `SELF_URL`, `PORT` and `PEERS` are required; a node cannot join a cluster
//! without knowing its own external URL and at least a seed peer list.
//! Replica count, quorums and gossip timing have working defaults and are
//! only overridden for tuning or tests.

use anyhow::{Context, Result, bail};
use std::time::Duration;

pub const DEFAULT_REPLICAS: usize = 3;
pub const DEFAULT_READ_QUORUM: usize = 2;
pub const DEFAULT_WRITE_QUORUM: usize = 2;
pub const DEFAULT_VIRTUAL_NODES: usize = 1;
pub const DEFAULT_GOSSIP_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(15);

/// Runtime configuration for a single node.
#[derive(Debug, Clone)]
pub struct Config {
    /// External URL other nodes use to reach this node, e.g. `http://kv1:8080`.
    pub self_url: String,
    /// TCP port the HTTP server listens on.
    pub port: u16,
    /// Seed peer URLs, excluding self.
    pub peers: Vec<String>,
    /// Number of replicas each key is written to.
    pub replicas: usize,
    /// Minimum successful replicas for a read to be reported as successful.
    pub read_quorum: usize,
    /// Minimum successful replicas for a write to be reported as successful.
    pub write_quorum: usize,
    /// Hash-ring slots per peer.
    pub virtual_nodes: usize,
    /// Delay between gossip ticks.
    pub gossip_interval: Duration,
    /// Idle duration after which a peer is dropped from the ring.
    pub peer_timeout: Duration,
}

impl Config {
    /// Loads the configuration from environment variables.
    ///
    /// Required: `SELF_URL`, `PORT`, `PEERS` (comma-separated URLs).
    /// Optional: `REPLICAS`, `READ_QUORUM`, `WRITE_QUORUM`, `VIRTUAL_NODES`,
    /// `GOSSIP_INTERVAL_MS`, `PEER_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self> {
        let self_url =
            std::env::var("SELF_URL").context("Missing environment variable SELF_URL")?;
        let port: u16 = std::env::var("PORT")
            .context("Missing environment variable PORT")?
            .parse()
            .context("PORT must be a valid port number")?;
        let peers_raw = std::env::var("PEERS").context("Missing environment variable PEERS")?;
        let peers: Vec<String> = peers_raw
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        let config = Self {
            self_url,
            port,
            peers,
            replicas: env_or("REPLICAS", DEFAULT_REPLICAS),
            read_quorum: env_or("READ_QUORUM", DEFAULT_READ_QUORUM),
            write_quorum: env_or("WRITE_QUORUM", DEFAULT_WRITE_QUORUM),
            virtual_nodes: env_or("VIRTUAL_NODES", DEFAULT_VIRTUAL_NODES),
            gossip_interval: Duration::from_millis(env_or(
                "GOSSIP_INTERVAL_MS",
                DEFAULT_GOSSIP_INTERVAL.as_millis() as u64,
            )),
            peer_timeout: Duration::from_millis(env_or(
                "PEER_TIMEOUT_MS",
                DEFAULT_PEER_TIMEOUT.as_millis() as u64,
            )),
        };
        config.validate()
    }

    /// Checks the cluster parameters for internal consistency.
    pub fn validate(self) -> Result<Self> {
        if self.self_url.is_empty() {
            bail!("SELF_URL must not be empty");
        }
        if self.virtual_nodes == 0 {
            bail!("VIRTUAL_NODES must be at least 1");
        }
        if self.read_quorum == 0 || self.read_quorum > self.replicas {
            bail!(
                "READ_QUORUM must be within 1..={}, got {}",
                self.replicas,
                self.read_quorum
            );
        }
        if self.write_quorum == 0 || self.write_quorum > self.replicas {
            bail!(
                "WRITE_QUORUM must be within 1..={}, got {}",
                self.replicas,
                self.write_quorum
            );
        }
        Ok(self)
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
