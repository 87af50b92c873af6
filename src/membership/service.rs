use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::types::{GossipMessage, PeerInfo};
use crate::config::Config;
use crate::routing::ring::HashRing;

/// Gossip pushes are cheap and best-effort; a slow peer is treated as down.
const GOSSIP_SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Maintains the peer table and keeps the shared hash ring in sync with
/// peer liveness. One instance per node, shared behind an `Arc`.
pub struct MembershipService {
    self_url: String,
    peers: DashMap<String, PeerInfo>,
    ring: Arc<RwLock<HashRing>>,
    http: reqwest::Client,
    gossip_interval: Duration,
    peer_timeout: Duration,
}

impl MembershipService {
    /// Creates the service with the peer table seeded from the configured
    /// peer list. Self is always a member of its own table.
    pub fn new(config: &Config, ring: Arc<RwLock<HashRing>>) -> Result<Arc<Self>> {
        let peers = DashMap::new();
        peers.insert(
            config.self_url.clone(),
            PeerInfo::seen_now(&config.self_url),
        );
        for peer in &config.peers {
            peers.insert(peer.clone(), PeerInfo::seen_now(peer));
        }

        let http = reqwest::Client::builder()
            .timeout(GOSSIP_SEND_TIMEOUT)
            .build()
            .context("failed to build gossip HTTP client")?;

        Ok(Arc::new(Self {
            self_url: config.self_url.clone(),
            peers,
            ring,
            http,
            gossip_interval: config.gossip_interval,
            peer_timeout: config.peer_timeout,
        }))
    }

    /// Spawns the background gossip ticker.
    pub async fn start(self: Arc<Self>) {
        info!("Starting gossip every {:?}", self.gossip_interval);

        let service = self.clone();
        tokio::spawn(async move {
            service.gossip_loop().await;
        });
    }

    async fn gossip_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.gossip_interval);

        loop {
            interval.tick().await;
            self.gossip_tick().await;
        }
    }

    /// One gossip round: refresh self, pick a random live peer, push the
    /// full peer table to it. A tick with no eligible peer is a no-op.
    pub async fn gossip_tick(&self) {
        self.touch(&self.self_url);

        if let Some(target) = self.pick_gossip_target() {
            self.send_gossip(&target).await;
        }
    }

    /// Picks a uniformly random peer other than self whose `last_seen` is
    /// within the peer timeout.
    pub fn pick_gossip_target(&self) -> Option<String> {
        let candidates: Vec<String> = self
            .peers
            .iter()
            .filter(|entry| entry.key() != &self.self_url && self.is_fresh(entry.last_seen))
            .map(|entry| entry.key().clone())
            .collect();

        if candidates.is_empty() {
            return None;
        }

        use rand::Rng;
        let idx = rand::thread_rng().gen_range(0..candidates.len());
        Some(candidates[idx].clone())
    }

    /// Pushes the full peer table to `target`. Send failures are logged
    /// only; gossip is best-effort.
    pub async fn send_gossip(&self, target: &str) {
        let msg = GossipMessage {
            sender: self.self_url.clone(),
            peers: self.snapshot(),
        };

        let result = self
            .http
            .post(format!("{}/kv/gossip", target))
            .json(&msg)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                debug!("Sent gossip to {}, status: {}", target, resp.status());
                self.touch(target);
            }
            Ok(resp) => {
                warn!("Gossip to {} rejected with status {}", target, resp.status());
            }
            Err(e) => {
                warn!("Error sending gossip to {}: {}", target, e);
            }
        }
    }

    /// Merges a received gossip message into the local view: newest
    /// `last_seen` wins per URL, the ring is reconciled against the merged
    /// table, and the sender itself is marked freshly seen (inserting it if
    /// this is the first contact).
    pub async fn handle_gossip(&self, msg: GossipMessage) {
        debug!("Gossip received from {}", msg.sender);

        for (url, incoming) in &msg.peers {
            self.merge_peer(url, incoming);
        }
        self.reconcile_ring().await;
        self.touch(&msg.sender);
    }

    /// Aligns ring membership with peer liveness: timed-out peers are
    /// removed, fresh peers that fell off (or were never added) are added.
    pub async fn reconcile_ring(&self) {
        let mut ring = self.ring.write().await;
        for entry in self.peers.iter() {
            if !self.is_fresh(entry.last_seen) {
                ring.remove(&entry.url);
            } else if !ring.contains(&entry.url) {
                info!("Peer {} joined the ring", entry.url);
                ring.add(&entry.url);
            }
        }
    }

    /// Snapshot of the peer table for serialization.
    pub fn snapshot(&self) -> HashMap<String, PeerInfo> {
        self.peers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn peer(&self, url: &str) -> Option<PeerInfo> {
        self.peers.get(url).map(|entry| entry.value().clone())
    }

    /// Marks `url` as seen now, inserting it if unknown. `last_seen` never
    /// moves backwards.
    pub fn touch(&self, url: &str) {
        let now = Utc::now();
        self.peers
            .entry(url.to_string())
            .and_modify(|info| {
                if now > info.last_seen {
                    info.last_seen = now;
                }
            })
            .or_insert_with(|| PeerInfo {
                url: url.to_string(),
                last_seen: now,
            });
    }

    fn merge_peer(&self, url: &str, incoming: &PeerInfo) {
        self.peers
            .entry(url.to_string())
            .and_modify(|local| {
                if incoming.last_seen > local.last_seen {
                    local.last_seen = incoming.last_seen;
                }
            })
            .or_insert_with(|| PeerInfo {
                url: url.to_string(),
                last_seen: incoming.last_seen,
            });
    }

    fn is_fresh(&self, last_seen: DateTime<Utc>) -> bool {
        match Utc::now().signed_duration_since(last_seen).to_std() {
            Ok(age) => age < self.peer_timeout,
            // A last_seen in the future only happens with clock skew;
            // treat it as fresh.
            Err(_) => true,
        }
    }
}
