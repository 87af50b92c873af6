use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

use super::protocol::{FORWARDED_HEADER, FORWARDED_VALUE, TIMESTAMP_HEADER};
use crate::storage::memory::ValueVersion;

/// Per-sub-request deadline. An unbounded client would let one
/// slow-but-not-dead replica stall the whole quorum.
const SUB_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Failure of a single peer sub-request. These are recovered by the
/// coordinator (logged, the replica dropped from the success set) and never
/// surface to the client directly.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("key not found on peer")]
    NotFound,
    #[error("peer returned status {0}")]
    Status(StatusCode),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("undecodable peer response: {0}")]
    Decode(String),
}

/// Seam between the coordinator and the network, so coordination logic can
/// be exercised against a scripted peer in tests.
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// Replicates a write to `target`, carrying the coordinator-assigned
    /// timestamp. Success iff the peer answers 200 with a decodable version.
    async fn forward_write(
        &self,
        target: &str,
        key: &str,
        value: &str,
        timestamp: i64,
    ) -> Result<ValueVersion, PeerError>;

    /// Reads `key` from `target`'s local store.
    async fn forward_read(&self, target: &str, key: &str) -> Result<ValueVersion, PeerError>;
}

/// HTTP implementation used in production: re-issues the client's request
/// shape against `{target}/kv` with the forwarded marker set.
pub struct HttpPeerClient {
    http: reqwest::Client,
}

impl HttpPeerClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(SUB_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn forward_write(
        &self,
        target: &str,
        key: &str,
        value: &str,
        timestamp: i64,
    ) -> Result<ValueVersion, PeerError> {
        let resp = self
            .http
            .post(format!("{}/kv", target))
            .query(&[("key", key), ("value", value)])
            .header(FORWARDED_HEADER, FORWARDED_VALUE)
            .header(TIMESTAMP_HEADER, timestamp.to_string())
            .send()
            .await?;
        decode_version(resp).await
    }

    async fn forward_read(&self, target: &str, key: &str) -> Result<ValueVersion, PeerError> {
        let resp = self
            .http
            .get(format!("{}/kv", target))
            .query(&[("key", key)])
            .header(FORWARDED_HEADER, FORWARDED_VALUE)
            .send()
            .await?;
        decode_version(resp).await
    }
}

/// The 200 body of `/kv` is a `KvResponse`; `ValueVersion` picks up its
/// `value` and `timestamp` fields and ignores the echoed key.
async fn decode_version(resp: reqwest::Response) -> Result<ValueVersion, PeerError> {
    match resp.status() {
        StatusCode::OK => resp
            .json::<ValueVersion>()
            .await
            .map_err(|e| PeerError::Decode(e.to_string())),
        StatusCode::NOT_FOUND => Err(PeerError::NotFound),
        status => Err(PeerError::Status(status)),
    }
}
