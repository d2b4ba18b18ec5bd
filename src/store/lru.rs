//! Byte-budgeted LRU store.
//!
//! Entries are kept in access order inside a [`LinkedHashMap`]: the front of
//! the map is the least recently used entry and the back the most recent.
//! Memory is accounted as `key length + value length` per entry, and inserts
//! evict from the front until the budget holds again.
//!
//! The store is not synchronized; [`MainCache`](super::cache::MainCache)
//! wraps it in a mutex.

use super::byteview::ByteView;
use linked_hash_map::LinkedHashMap;

/// Invoked with the key and value of every evicted entry.
pub type EvictionHandler = Box<dyn FnMut(&str, &ByteView) + Send>;

pub struct LruStore {
    /// Maximum number of bytes the store may hold. Zero disables the budget.
    max_bytes: usize,
    /// Current accounted bytes over all entries.
    nbytes: usize,
    entries: LinkedHashMap<String, ByteView>,
    on_evicted: Option<EvictionHandler>,
}

impl LruStore {
    pub fn new(max_bytes: usize, on_evicted: Option<EvictionHandler>) -> Self {
        Self {
            max_bytes,
            nbytes: 0,
            entries: LinkedHashMap::new(),
            on_evicted,
        }
    }

    /// Inserts or refreshes an entry, then evicts until the budget holds.
    ///
    /// Re-adding an existing key promotes it to most recent and adjusts the
    /// accounting by the difference in value size.
    pub fn add(&mut self, key: &str, value: ByteView) {
        if let Some(existing) = self.entries.get_refresh(key) {
            self.nbytes = self.nbytes + value.len() - existing.len();
            *existing = value;
        } else {
            self.nbytes += key.len() + value.len();
            self.entries.insert(key.to_string(), value);
        }

        while self.max_bytes != 0 && self.nbytes > self.max_bytes {
            self.remove_oldest();
        }
    }

    /// Looks up a key and promotes it to most recent on a hit.
    pub fn get(&mut self, key: &str) -> Option<ByteView> {
        self.entries.get_refresh(key).map(|value| value.clone())
    }

    /// Drops the least recently used entry and notifies the eviction handler.
    pub fn remove_oldest(&mut self) {
        if let Some((key, value)) = self.entries.pop_front() {
            self.nbytes -= key.len() + value.len();
            if let Some(on_evicted) = self.on_evicted.as_mut() {
                on_evicted(&key, &value);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Accounted bytes currently held.
    pub fn nbytes(&self) -> usize {
        self.nbytes
    }
}
