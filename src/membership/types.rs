use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single entry in the peer table.
///
/// `last_seen` is the last wall-clock instant at which a gossip exchange
/// involving this peer succeeded, either directly or as relayed by another
/// node. It is monotonically non-decreasing per URL and serializes as an
/// RFC 3339 timestamp with nanosecond precision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeerInfo {
    pub url: String,
    pub last_seen: DateTime<Utc>,
}

impl PeerInfo {
    pub fn seen_now(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            last_seen: Utc::now(),
        }
    }
}

/// The wire format of one gossip push: the sender's URL plus its full peer
/// table. Receivers merge the table entry-wise by newest `last_seen`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GossipMessage {
    pub sender: String,
    pub peers: HashMap<String, PeerInfo>,
}
