//! Concurrent store façade.
//!
//! Each namespace owns one `MainCache`, which binds the replacement policy
//! chosen at construction to a lock. The backing store is created lazily on
//! the first insert, so building a namespace costs nothing until it is used.

use super::arc::ArcStore;
use super::byteview::ByteView;
use super::lru::LruStore;
use parking_lot::Mutex;
use std::sync::OnceLock;
use std::time::Duration;

/// Replacement policy for a namespace, fixed at construction.
#[derive(Debug, Clone)]
pub enum CachePolicy {
    /// Recency eviction bounded by a byte budget (zero means unbounded).
    Lru { max_bytes: usize },
    /// Adaptive replacement bounded by an entry count. Entries inserted by
    /// the namespace expire after `default_ttl`, if set.
    Arc {
        capacity: usize,
        default_ttl: Option<Duration>,
    },
}

enum Backend {
    // A single mutex rather than a read/write lock: lookups mutate recency.
    Lru(Mutex<LruStore>),
    Arc(ArcStore),
}

pub struct MainCache {
    policy: CachePolicy,
    backend: OnceLock<Backend>,
}

impl MainCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            backend: OnceLock::new(),
        }
    }

    fn backend(&self) -> &Backend {
        self.backend.get_or_init(|| match self.policy {
            CachePolicy::Lru { max_bytes } => {
                Backend::Lru(Mutex::new(LruStore::new(max_bytes, None)))
            }
            CachePolicy::Arc { capacity, .. } => Backend::Arc(ArcStore::new(capacity)),
        })
    }

    pub fn add(&self, key: &str, value: ByteView) {
        match self.backend() {
            Backend::Lru(store) => store.lock().add(key, value),
            Backend::Arc(store) => {
                let ttl = match self.policy {
                    CachePolicy::Arc { default_ttl, .. } => default_ttl,
                    CachePolicy::Lru { .. } => None,
                };
                store.put(key, value, ttl);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<ByteView> {
        // Before the first insert there is nothing to look up.
        match self.backend.get()? {
            Backend::Lru(store) => store.lock().get(key),
            Backend::Arc(store) => store.get(key),
        }
    }

    pub fn len(&self) -> usize {
        match self.backend.get() {
            Some(Backend::Lru(store)) => store.lock().len(),
            Some(Backend::Arc(store)) => store.len(),
            None => 0,
        }
    }
}
