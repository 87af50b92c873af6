//! Key Routing Module
//!
//! Implements the consistent hash ring that maps every key to a deterministic
//! ordered replica set of peers.
//!
//! ## Core Mechanisms
//! - **Hashing**: Keys and virtual-node labels are hashed with SHA-1 and the
//!   first four digest bytes are folded into a big-endian `u32` slot. Every
//!   node in the cluster must agree on this derivation or replica selection
//!   diverges.
//! - **Virtual nodes**: Each peer occupies a fixed number of slots on the
//!   ring, smoothing the key distribution across peers.
//! - **Replica selection**: A key's replicas are the distinct owners
//!   encountered walking the ring clockwise from the key's slot, wrapping at
//!   the end. The walk order is preserved: the first entry is the natural
//!   primary.

pub mod ring;

#[cfg(test)]
mod tests;
