//! Peer API Handlers
//!
//! Server side of the peer protocol: translate `<base>/<group>/<key>`
//! requests into group lookups and encode the result on the wire.

use super::protocol::FetchResponse;
use crate::group::registry;
use axum::extract::Path;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use prost::Message;

/// Serves one key from one group for a remote peer.
///
/// Unknown groups are a 404 so a misconfigured peer can tell "wrong cluster"
/// apart from a failed load, which surfaces as a 500 with the error text.
pub async fn handle_fetch(Path((group_name, key)): Path<(String, String)>) -> Response {
    tracing::debug!("peer fetch {}/{}", group_name, key);

    let Some(group) = registry::get_group(&group_name) else {
        return (
            StatusCode::NOT_FOUND,
            format!("no such group: {}", group_name),
        )
            .into_response();
    };

    match group.get(&key).await {
        Ok(view) => {
            let body = FetchResponse {
                value: view.byte_slice(),
            }
            .encode_to_vec();
            (
                [(header::CONTENT_TYPE, "application/octet-stream")],
                body,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("fetch of {}/{} failed: {:#}", group_name, key, error);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{error:#}")).into_response()
        }
    }
}

/// Fallback for every other path shape under the base path.
pub async fn handle_malformed_path() -> impl IntoResponse {
    (StatusCode::BAD_REQUEST, "bad request")
}
