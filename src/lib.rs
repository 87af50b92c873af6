//! Distributed Key-Value Store Node Library
//!
//! This library crate defines the core modules that make up a ringkv node.
//! It serves as the foundation for the binary executable (`main.rs`).
//!
//! ## Architecture Modules
//! Every node in the cluster is symmetric and composed of four subsystems:
//!
//! - **`routing`**: The consistent hash ring. Maps keys to an ordered replica
//!   set of peers using SHA-1 based virtual-node slots, stable under churn.
//! - **`storage`**: The local state layer. An in-memory map from key to the
//!   latest known `(value, timestamp)` version, safe for concurrent access.
//! - **`membership`**: The cluster coordination layer. Uses periodic
//!   full-table gossip over HTTP to propagate peer liveness and drives ring
//!   membership through a liveness timeout.
//! - **`coordinator`**: The request entry point. Turns a client read or write
//!   into a quorum-gated replicated operation across the replica set and
//!   reconciles divergent reads by last-writer-wins.
//!
//! `config` and `node` carry the environment configuration and the HTTP
//! assembly that wire the subsystems into a running process.

pub mod config;
pub mod coordinator;
pub mod membership;
pub mod node;
pub mod routing;
pub mod storage;
