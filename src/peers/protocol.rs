//! Peer Wire Protocol
//!
//! Defines the messages exchanged between peers and the URL contract they
//! are served under.
//!
//! The encoding is protobuf via `prost`. Tag numbers, wire types and the
//! default-on-absent rules (empty string, empty bytes) are the compatibility
//! contract: every peer in a cluster must agree on them, and nothing else
//! about the transport leaks into the cache core.

/// Path prefix every peer mounts the fetch endpoint under. Requests take the
/// form `<base><group>/<key>` with both segments URL-escaped.
pub const DEFAULT_BASE_PATH: &str = "/_peercache/";

/// Asks a peer for one key in one group.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FetchRequest {
    #[prost(string, tag = "1")]
    pub group: String,
    #[prost(string, tag = "2")]
    pub key: String,
}

/// The raw value bytes for a fetch.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FetchResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub value: Vec<u8>,
}
