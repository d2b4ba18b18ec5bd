//! Virtual-node hash ring.
//!
//! The ring is a sorted vector of 32-bit positions plus a position-to-peer
//! map. It is deliberately not synchronized: the peer pool builds a fresh
//! ring on every membership change and publishes it as a unit under its own
//! lock, so readers never observe a partially sorted state.

use std::collections::HashMap;

/// Hash function placing byte strings on the ring.
pub type HashFn = Box<dyn Fn(&[u8]) -> u32 + Send + Sync>;

/// Consistent-hash ring with virtual nodes.
pub struct HashRing {
    replicas: usize,
    hash: HashFn,
    /// Sorted virtual positions of all peers.
    positions: Vec<u32>,
    /// Position to peer id. Duplicate positions resolve last-write-wins.
    owners: HashMap<u32, String>,
}

impl HashRing {
    /// Creates an empty ring with `replicas` virtual positions per peer.
    ///
    /// Passing `None` for the hash function selects CRC32/IEEE, which every
    /// node must share for cross-node ownership to agree.
    pub fn new(replicas: usize, hash: Option<HashFn>) -> Self {
        Self {
            replicas,
            hash: hash.unwrap_or_else(|| Box::new(crc32fast::hash)),
            positions: Vec::new(),
            owners: HashMap::new(),
        }
    }

    /// Inserts virtual positions for each peer id and re-sorts the ring.
    pub fn add<S: AsRef<str>>(&mut self, ids: &[S]) {
        for id in ids {
            let id = id.as_ref();
            for i in 0..self.replicas {
                let position = (self.hash)(format!("{}{}", i, id).as_bytes());
                self.positions.push(position);
                self.owners.insert(position, id.to_string());
            }
        }
        self.positions.sort_unstable();
    }

    /// Returns the peer owning `key`, or `None` if the ring is empty.
    ///
    /// Ownership is the first position at or after the key's hash; keys
    /// hashing above the highest position wrap to the lowest one.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.positions.is_empty() {
            return None;
        }

        let hash = (self.hash)(key.as_bytes());
        let index = self.positions.partition_point(|&position| position < hash);
        let position = self.positions[index % self.positions.len()];
        self.owners.get(&position).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
