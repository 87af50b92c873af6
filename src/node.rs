//! Node Assembly
//!
//! Wires the subsystems into a running node: seeds the ring and peer table
//! from configuration, builds the HTTP router, starts the gossip ticker and
//! serves until shutdown. Kept in the library so integration tests can boot
//! full nodes in-process.

use anyhow::Result;
use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::Config;
use crate::coordinator::client::{HttpPeerClient, PeerClient};
use crate::coordinator::handlers::{
    handle_get, handle_get_all, handle_gossip, handle_health, handle_put,
};
use crate::coordinator::service::Coordinator;
use crate::membership::service::MembershipService;
use crate::routing::ring::HashRing;
use crate::storage::memory::MemoryStore;

/// A fully wired node, ready to serve. The shared components stay reachable
/// so tests can observe ring and store state from outside.
pub struct Node {
    pub config: Config,
    pub ring: Arc<RwLock<HashRing>>,
    pub store: Arc<MemoryStore>,
    pub membership: Arc<MembershipService>,
    pub coordinator: Arc<Coordinator<HttpPeerClient>>,
}

impl Node {
    pub fn new(config: Config) -> Result<Self> {
        let mut ring = HashRing::with_peers(&config.peers, config.virtual_nodes);
        ring.add(&config.self_url);
        let ring = Arc::new(RwLock::new(ring));

        let store = Arc::new(MemoryStore::new());
        let membership = MembershipService::new(&config, ring.clone())?;
        let coordinator = Arc::new(Coordinator::new(
            &config,
            ring.clone(),
            store.clone(),
            HttpPeerClient::new()?,
        ));

        Ok(Self {
            config,
            ring,
            store,
            membership,
            coordinator,
        })
    }

    /// Starts the gossip ticker and serves the HTTP surface until the
    /// process is stopped.
    pub async fn serve(self) -> Result<()> {
        self.membership.clone().start().await;

        let app = router(self.coordinator, self.membership);
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Listening on {}", addr);
        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Builds the HTTP surface: the coordinated `/kv` endpoints, the
/// administrative listing, the gossip receiver and the health check.
pub fn router<C: PeerClient + 'static>(
    coordinator: Arc<Coordinator<C>>,
    membership: Arc<MembershipService>,
) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/kv", get(handle_get::<C>).post(handle_put::<C>))
        .route("/kv/all", get(handle_get_all::<C>))
        .route("/kv/gossip", post(handle_gossip))
        .layer(Extension(coordinator))
        .layer(Extension(membership))
}

/// Boots a node from configuration and serves forever.
pub async fn run(config: Config) -> Result<()> {
    info!("SELF_URL: {}", config.self_url);
    info!("PORT    : {}", config.port);
    info!("PEERS   : {:?}", config.peers);

    Node::new(config)?.serve().await
}
