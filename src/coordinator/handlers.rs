//! KV API Handlers
//!
//! HTTP endpoints exposing the coordinator to clients and peers. These
//! handlers translate requests into coordinator calls and map
//! `CoordinatorError` onto status codes; the forwarded-flag header decides
//! whether a request is coordinated or executed locally.

use axum::{
    Json,
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

use super::client::PeerClient;
use super::protocol::{ErrorResponse, FORWARDED_HEADER, FORWARDED_VALUE, TIMESTAMP_HEADER};
use super::service::{Coordinator, CoordinatorError};
use crate::membership::service::MembershipService;
use crate::membership::types::GossipMessage;

#[derive(Debug, Deserialize)]
pub struct KvQuery {
    pub key: Option<String>,
    pub value: Option<String>,
}

/// Client/peer read on `GET /kv`.
pub async fn handle_get<C: PeerClient + 'static>(
    Extension(coordinator): Extension<Arc<Coordinator<C>>>,
    headers: HeaderMap,
    Query(query): Query<KvQuery>,
) -> Response {
    let Some(key) = query.key.filter(|k| !k.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing key");
    };

    let result = if is_forwarded(&headers) {
        coordinator.read_local(&key)
    } else {
        coordinator.read(&key).await
    };

    match result {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(e) => coordinator_error(e),
    }
}

/// Client/peer write on `POST /kv`.
pub async fn handle_put<C: PeerClient + 'static>(
    Extension(coordinator): Extension<Arc<Coordinator<C>>>,
    headers: HeaderMap,
    Query(query): Query<KvQuery>,
) -> Response {
    let Some(key) = query.key.filter(|k| !k.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing key");
    };
    let Some(value) = query.value.filter(|v| !v.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing value");
    };

    if is_forwarded(&headers) {
        let resp = coordinator.apply_forwarded_write(&key, &value, forwarded_timestamp(&headers));
        return (StatusCode::OK, Json(resp)).into_response();
    }

    match coordinator.write(&key, &value).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(e) => coordinator_error(e),
    }
}

/// Administrative listing of the local store on `GET /kv/all`.
pub async fn handle_get_all<C: PeerClient + 'static>(
    Extension(coordinator): Extension<Arc<Coordinator<C>>>,
) -> Response {
    (StatusCode::OK, Json(coordinator.all())).into_response()
}

/// Gossip receive on `POST /kv/gossip`. The body is decoded by hand so a
/// malformed payload yields a 500 with an error body rather than an
/// extractor rejection.
pub async fn handle_gossip(
    Extension(membership): Extension<Arc<MembershipService>>,
    body: String,
) -> Response {
    let msg: GossipMessage = match serde_json::from_str(&body) {
        Ok(msg) => msg,
        Err(e) => {
            error!("Error decoding gossip message: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error decoding gossip message",
            );
        }
    };
    membership.handle_gossip(msg).await;
    StatusCode::OK.into_response()
}

pub async fn handle_health() -> &'static str {
    "OK"
}

fn is_forwarded(headers: &HeaderMap) -> bool {
    headers
        .get(FORWARDED_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == FORWARDED_VALUE)
}

fn forwarded_timestamp(headers: &HeaderMap) -> Option<i64> {
    headers
        .get(TIMESTAMP_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

fn coordinator_error(e: CoordinatorError) -> Response {
    let status = match e {
        CoordinatorError::NotFound { .. } => StatusCode::NOT_FOUND,
        CoordinatorError::WriteQuorumNotMet { .. } | CoordinatorError::ReadQuorumNotMet { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, e.to_string())
}

fn error_response(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: msg.into() })).into_response()
}
