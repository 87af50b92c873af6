//! Coordination Module
//!
//! Turns a client request into a quorum-gated replicated operation.
//!
//! ## Core Mechanisms
//! - **Replica fan-out**: The node that receives a client request computes
//!   the key's replica set from the ring and dispatches each replica either
//!   to its local store or to the peer via a single-hop sub-request.
//! - **Forwarded flag**: Every sub-request carries the `X-From-Node` marker.
//!   A marked incoming request is executed locally and never re-replicated,
//!   which keeps the symmetric mesh to one hop.
//! - **Quorum gates**: A write or read is reported successful only when at
//!   least the configured quorum of replicas succeeded; shortfalls surface
//!   to the client with the observed counts.
//! - **Last-writer-wins**: Divergent read responses are reconciled by
//!   keeping the version with the greatest coordinator-assigned timestamp.

pub mod client;
pub mod handlers;
pub mod protocol;
pub mod service;
