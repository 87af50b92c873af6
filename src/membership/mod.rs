//! Membership & Gossip Module
//!
//! Maintains each node's view of the cluster and keeps the hash ring in sync
//! with peer liveness.
//!
//! ## Core Mechanisms
//! - **Gossip Protocol**: A background ticker periodically pushes the full
//!   peer table to one random live peer over HTTP. Information spreads
//!   epidemically with O(log N) convergence under random selection.
//! - **Last-seen merge**: Peer records carry a `last_seen` timestamp that
//!   only moves forward. Incoming gossip replaces a local entry only when it
//!   is strictly newer, so every node's table converges to the per-peer
//!   maximum.
//! - **Ring reconciliation**: Peers whose `last_seen` is older than the peer
//!   timeout are dropped from the ring; fresh peers are (re-)added. The peer
//!   table itself never forgets a peer, only the ring does.

pub mod service;
pub mod types;
