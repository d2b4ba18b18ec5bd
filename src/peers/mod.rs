//! Peer Abstraction and HTTP Transport
//!
//! Two thin capabilities isolate the cluster transport from the cache core:
//! a picker that maps a key to the peer owning it, and a getter that fetches
//! a value from one peer. Groups only ever see these traits, so unit tests
//! can plug in in-process peers while production uses the HTTP pool.
//!
//! ## Components
//! - **`protocol`**: the length-prefixed, field-tagged wire messages and the
//!   shared base path contract.
//! - **`http`**: the HTTP pool, which serves the peer protocol for this node
//!   and holds one client per remote peer.
//! - **`handlers`**: the server-side request handlers.

pub mod handlers;
pub mod http;
pub mod protocol;

#[cfg(test)]
mod tests;

use anyhow::Result;
use protocol::{FetchRequest, FetchResponse};
use std::sync::Arc;

/// Locates the peer that owns a key.
pub trait PeerPicker: Send + Sync {
    /// Returns a getter for the owning peer, or `None` when this node owns
    /// the key itself (or no peers are known).
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>>;
}

/// Fetches a value from a single remote peer.
#[async_trait::async_trait]
pub trait PeerGetter: Send + Sync {
    async fn get(&self, request: &FetchRequest) -> Result<FetchResponse>;
}
