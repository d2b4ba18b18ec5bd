//! Cache Storage
//!
//! The storage layer a cache namespace sits on: an immutable value view, two
//! replacement policies and a concurrent façade binding one of them to a
//! namespace.
//!
//! ## Core Concepts
//! - **ByteView**: immutable byte carrier; every boundary hands out copies so
//!   cached content can never be mutated from outside.
//! - **LruStore**: byte-budgeted recency eviction.
//! - **ArcStore**: adaptive replacement (recency and frequency lists plus
//!   ghost history) with per-entry TTL and a background reaper.
//! - **MainCache**: the lock-protected, lazily-initialized policy store each
//!   namespace owns.

pub mod arc;
pub mod byteview;
pub mod cache;
pub mod lru;
