//! Cache Namespaces
//!
//! A [`Group`] is a named cache namespace: it owns the local store, the
//! loader that materializes missing values, and (once peers are registered)
//! the routing logic that decides whether a miss is served locally or by the
//! authoritative peer.
//!
//! ## Read path
//! - **Hit**: the local store answers immediately.
//! - **Miss**: the request enters the per-key coalescer. If a remote peer
//!   owns the key, the value is fetched from it and returned without being
//!   stored here; only the owner caches long-term, which keeps the cluster's
//!   collective working set bounded. If this node owns the key (or no peers
//!   are registered), the loader runs and the result is cached locally.
//! - Peer failures degrade to the local loader, so a reachable data source
//!   keeps the cluster answering through partial outages.

pub mod registry;


use crate::flight::coalesce::SingleFlight;
use crate::peers::protocol::FetchRequest;
use crate::peers::{PeerGetter, PeerPicker};
use crate::store::byteview::ByteView;
use crate::store::cache::{CachePolicy, MainCache};
use anyhow::{Result, bail};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};

/// Boxed async loader invoked on an authoritative cache miss.
pub type LoaderFn =
    Arc<dyn Fn(String) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send>> + Send + Sync>;

/// Wraps a plain async closure into a [`LoaderFn`].
pub fn loader<F, Fut>(load: F) -> LoaderFn
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<u8>>> + Send + 'static,
{
    Arc::new(move |key: String| {
        Box::pin(load(key)) as Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send>>
    })
}

/// A named cache namespace.
pub struct Group {
    name: String,
    loader: LoaderFn,
    main_cache: MainCache,
    peers: OnceLock<Arc<dyn PeerPicker>>,
    flight: SingleFlight<ByteView>,
}

impl Group {
    pub(crate) fn new(name: &str, policy: CachePolicy, loader: LoaderFn) -> Self {
        Self {
            name: name.to_string(),
            loader,
            main_cache: MainCache::new(policy),
            peers: OnceLock::new(),
            flight: SingleFlight::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entries currently resident in the local store.
    pub fn cache_len(&self) -> usize {
        self.main_cache.len()
    }

    /// Attaches the peer picker. May be called at most once per group;
    /// wiring peers twice is a configuration bug, so a second call panics.
    pub fn register_peers(&self, picker: Arc<dyn PeerPicker>) {
        if self.peers.set(picker).is_err() {
            panic!("register_peers called more than once for group {}", self.name);
        }
    }

    /// Returns the cached value for `key`, loading it on a miss.
    pub async fn get(&self, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            bail!("key is required");
        }

        if let Some(view) = self.main_cache.get(key) {
            tracing::debug!("cache hit for {}/{}", self.name, key);
            return Ok(view);
        }

        self.load(key).await
    }

    /// Loads a missing key, coalescing concurrent demand per key.
    async fn load(&self, key: &str) -> Result<ByteView> {
        self.flight
            .run(key, || async {
                if let Some(picker) = self.peers.get() {
                    if let Some(peer) = picker.pick_peer(key) {
                        match self.fetch_from_peer(peer.as_ref(), key).await {
                            Ok(view) => return Ok(view),
                            Err(error) => {
                                tracing::warn!(
                                    "peer fetch for {}/{} failed, falling back to loader: {:#}",
                                    self.name,
                                    key,
                                    error
                                );
                            }
                        }
                    }
                }

                self.load_locally(key).await
            })
            .await
    }

    /// Fetches the value from the peer that owns `key`. The result is not
    /// stored here; the owner already caches it.
    async fn fetch_from_peer(&self, peer: &dyn PeerGetter, key: &str) -> Result<ByteView> {
        let request = FetchRequest {
            group: self.name.clone(),
            key: key.to_string(),
        };
        let response = peer.get(&request).await?;
        Ok(ByteView::from(response.value))
    }

    /// Runs the loader and populates the local store. This is the
    /// authoritative path: either this node owns the key or no peers exist.
    async fn load_locally(&self, key: &str) -> Result<ByteView> {
        let bytes = (self.loader)(key.to_string()).await?;
        let view = ByteView::from(bytes);
        self.main_cache.add(key, view.clone());
        Ok(view)
    }
}
