//! Coordinator Wire Protocol
//!
//! Header markers and response DTOs shared by the HTTP handlers and the
//! peer RPC client.

use serde::{Deserialize, Serialize};

/// Marker header on inter-node sub-requests. Its presence means "already
/// coordinated, execute locally" and suppresses any further fan-out.
pub const FORWARDED_HEADER: &str = "X-From-Node";
pub const FORWARDED_VALUE: &str = "true";

/// Carries the coordinator-assigned write timestamp on forwarded writes so
/// every replica stores the identical version.
pub const TIMESTAMP_HEADER: &str = "X-Timestamp";

/// Successful response body for reads and writes on `/kv`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KvResponse {
    pub key: String,
    pub value: String,
    pub timestamp: i64,
}

/// Error response body on all failure paths.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
