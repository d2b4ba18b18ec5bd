//! Distributed In-Memory Cache Library
//!
//! This library crate defines the core of a peer-addressable, read-through
//! cache cluster. A client may ask any node for a value in a named
//! namespace; the node answers from its local store, fetches from the peer
//! that owns the key, or materializes the value through the namespace's
//! loader if it is the owner itself.
//!
//! ## Architecture Modules
//! The system is composed of five loosely coupled subsystems:
//!
//! - **`ring`**: Consistent hashing with virtual nodes. Maps every key to an
//!   owning peer and keeps reshuffling small when membership changes.
//! - **`store`**: The local storage layer: an immutable byte view, a
//!   byte-budgeted LRU policy, an adaptive-replacement policy with TTL
//!   expiry, and the lock-protected façade a namespace sits on.
//! - **`flight`**: Per-key request coalescing, so a burst of concurrent
//!   misses triggers exactly one loader or peer call.
//! - **`group`**: The namespace orchestrator binding store, loader, peers
//!   and coalescer, plus the process-wide namespace registry.
//! - **`peers`**: The peer abstraction and the HTTP transport implementing
//!   it: a pool that serves this node's share of the key space and fetches
//!   the rest from the owners.

pub mod flight;
pub mod group;
pub mod peers;
pub mod ring;
pub mod store;
