//! Adaptive replacement store with TTL expiry.
//!
//! Keeps two resident lists and two ghost lists:
//!
//! - **T1**: entries seen once recently.
//! - **T2**: entries seen more than once.
//! - **B1 / B2**: keys (no values) recently evicted from T1 / T2.
//!
//! A target `p` biases eviction between T1 and T2 and drifts as entries are
//! demoted, so the store adapts between recency-heavy and frequency-heavy
//! workloads on its own. Capacity counts entries, not bytes, and only T1 and
//! T2 hold values; ghost lists are capped at the capacity each.
//!
//! Entries may carry an expiry. Expired entries are dropped inline on `get`
//! and swept by a background reaper once per second, so correctness never
//! depends on the reaper running.

use super::byteview::ByteView;
use linked_hash_map::LinkedHashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

struct ArcEntry {
    value: ByteView,
    expires_at: Option<Instant>,
}

impl ArcEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// All four lists plus the adaptive target. The back of each map is the most
/// recently used end; `pop_front` takes the eviction candidate.
struct ArcState {
    capacity: usize,
    t1: LinkedHashMap<String, ArcEntry>,
    t2: LinkedHashMap<String, ArcEntry>,
    b1: LinkedHashMap<String, Option<Instant>>,
    b2: LinkedHashMap<String, Option<Instant>>,
    p: usize,
}

impl ArcState {
    fn get(&mut self, key: &str) -> Option<ByteView> {
        let now = Instant::now();

        if let Some(entry) = self.t1.remove(key) {
            if entry.is_expired(now) {
                return None;
            }
            // A second access proves reuse: migrate to the frequent list.
            let value = entry.value.clone();
            self.t2.insert(key.to_string(), entry);
            return Some(value);
        }

        if let Some(entry) = self.t2.remove(key) {
            if entry.is_expired(now) {
                return None;
            }
            let value = entry.value.clone();
            // Reinserting refreshes the entry to the most recent end.
            self.t2.insert(key.to_string(), entry);
            return Some(value);
        }

        None
    }

    fn put(&mut self, key: &str, value: ByteView, ttl: Option<Duration>) {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);

        if self.t1.contains_key(key) {
            // Update plus promotion, same as a hit.
            self.t1.remove(key);
            self.t2
                .insert(key.to_string(), ArcEntry { value, expires_at });
            return;
        }
        if let Some(entry) = self.t2.get_refresh(key) {
            entry.value = value;
            entry.expires_at = expires_at;
            return;
        }

        let entry = ArcEntry { value, expires_at };
        if self.t1.len() + self.t2.len() < self.capacity {
            self.t1.insert(key.to_string(), entry);
        } else {
            self.replace(key, entry);
        }
    }

    /// Demotes one resident entry to a ghost to make room, steering `p`
    /// toward whichever list keeps missing, then inserts the new entry into
    /// T1.
    fn replace(&mut self, key: &str, entry: ArcEntry) {
        if !self.t1.is_empty() && (self.p > 0 || self.b2.is_empty()) {
            if let Some((demoted, old)) = self.t1.pop_front() {
                self.b1.insert(demoted, old.expires_at);
                while self.b1.len() > self.capacity {
                    self.b1.pop_front();
                }
            }
            self.p = self.p.saturating_sub(1);
        } else {
            if let Some((demoted, old)) = self.t2.pop_front() {
                self.b2.insert(demoted, old.expires_at);
                while self.b2.len() > self.capacity {
                    self.b2.pop_front();
                }
            }
            self.p = (self.p + 1).min(self.capacity);
        }

        self.t1.insert(key.to_string(), entry);
    }

    fn remove(&mut self, key: &str) {
        if self.t1.remove(key).is_none() {
            self.t2.remove(key);
        }
    }

    fn clear(&mut self) {
        self.t1.clear();
        self.t2.clear();
        self.b1.clear();
        self.b2.clear();
        self.p = 0;
    }

    fn len(&self) -> usize {
        self.t1.len() + self.t2.len()
    }

    /// Sweeps expired entries out of every list.
    fn reap(&mut self) {
        let now = Instant::now();

        for list in [&mut self.t1, &mut self.t2] {
            let expired: Vec<String> = list
                .iter()
                .filter(|(_, entry)| entry.is_expired(now))
                .map(|(key, _)| key.clone())
                .collect();
            for key in expired {
                list.remove(&key);
            }
        }

        for ghosts in [&mut self.b1, &mut self.b2] {
            let expired: Vec<String> = ghosts
                .iter()
                .filter(|(_, expires_at)| expires_at.is_some_and(|at| at <= now))
                .map(|(key, _)| key.clone())
                .collect();
            for key in expired {
                ghosts.remove(&key);
            }
        }
    }
}

/// Concurrent ARC store. The reaper task shares the internal mutex with
/// callers, so its sweeps are atomic with respect to reads and writes.
pub struct ArcStore {
    state: Arc<Mutex<ArcState>>,
    stop: watch::Sender<bool>,
}

impl ArcStore {
    /// Creates a store holding up to `capacity` entries and spawns the
    /// reaper. Must be called within a tokio runtime.
    pub fn new(capacity: usize) -> Self {
        let state = Arc::new(Mutex::new(ArcState {
            capacity,
            t1: LinkedHashMap::new(),
            t2: LinkedHashMap::new(),
            b1: LinkedHashMap::new(),
            b2: LinkedHashMap::new(),
            p: 0,
        }));

        let (stop, mut stopped) = watch::channel(false);
        let reaper_state = state.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        reaper_state.lock().reap();
                    }
                    changed = stopped.changed() => {
                        // A send of `true` or the store being dropped both
                        // end the sweep.
                        if changed.is_err() || *stopped.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        Self { state, stop }
    }

    pub fn get(&self, key: &str) -> Option<ByteView> {
        self.state.lock().get(key)
    }

    /// Inserts or updates `key`. `ttl` of `None` disables expiry.
    pub fn put(&self, key: &str, value: ByteView, ttl: Option<Duration>) {
        self.state.lock().put(key, value, ttl);
    }

    pub fn remove(&self, key: &str) {
        self.state.lock().remove(key);
    }

    pub fn clear(&self) {
        self.state.lock().clear();
    }

    /// Resident entries (T1 plus T2); ghosts are not counted.
    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    /// Stops the background reaper. Safe to call more than once; dropping
    /// the store stops the reaper as well.
    pub fn close(&self) {
        let _ = self.stop.send(true);
    }
}
