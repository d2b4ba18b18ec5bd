//! HTTP peer pool.
//!
//! One `HttpPool` per node plays both transport roles: it builds the axum
//! router serving this node's share of the key space, and it holds one
//! client per remote peer for fetching the shares it does not own.
//!
//! Membership is re-seeded wholesale: `set_peers` builds a fresh ring and
//! client map and swaps both in under the pool mutex, so concurrent pickers
//! always observe a consistent pairing.

use super::protocol::{DEFAULT_BASE_PATH, FetchRequest, FetchResponse};
use super::{PeerGetter, PeerPicker, handlers};
use crate::ring::hashring::HashRing;
use anyhow::{Context, Result, anyhow, bail};
use axum::Router;
use axum::routing::get;
use parking_lot::Mutex;
use prost::Message;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Virtual positions each peer contributes to the ring.
const DEFAULT_REPLICAS: usize = 50;

/// Retry budget for fetches from one peer. A fetch that exhausts it surfaces
/// as a peer error and the group falls back to its loader, so the budget is
/// kept small: stretching it only delays the fallback.
#[derive(Debug, Clone, Copy)]
pub struct FetchConfig {
    /// Send attempts per fetch, counting the first one.
    pub attempts: u32,
    /// Backoff before the second attempt; later ones double it.
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_backoff: Duration::from_millis(120),
            max_backoff: Duration::from_secs(1),
            timeout: Duration::from_millis(500),
        }
    }
}

struct PoolState {
    ring: HashRing,
    getters: HashMap<String, Arc<HttpGetter>>,
}

/// Serves and consumes the peer protocol for one node.
pub struct HttpPool {
    /// This node's own base URL, e.g. `http://10.0.0.1:8001`.
    self_url: String,
    base_path: String,
    client: reqwest::Client,
    fetch: FetchConfig,
    state: Mutex<PoolState>,
}

impl HttpPool {
    pub fn new(self_url: &str) -> Arc<Self> {
        Self::with_config(self_url, DEFAULT_BASE_PATH, FetchConfig::default())
    }

    pub fn with_base_path(self_url: &str, base_path: &str) -> Arc<Self> {
        Self::with_config(self_url, base_path, FetchConfig::default())
    }

    pub fn with_config(self_url: &str, base_path: &str, fetch: FetchConfig) -> Arc<Self> {
        let trimmed = base_path.trim_matches('/');
        let base_path = if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", trimmed)
        };

        Arc::new(Self {
            self_url: self_url.trim_end_matches('/').to_string(),
            base_path,
            client: reqwest::Client::new(),
            fetch,
            state: Mutex::new(PoolState {
                ring: HashRing::new(DEFAULT_REPLICAS, None),
                getters: HashMap::new(),
            }),
        })
    }

    /// Replaces the cluster membership. Peers are base URLs and should
    /// include this node itself so the ring covers the whole key space.
    pub fn set_peers<S: AsRef<str>>(&self, peers: &[S]) {
        let mut ring = HashRing::new(DEFAULT_REPLICAS, None);
        let mut getters = HashMap::new();

        for peer in peers {
            let peer = peer.as_ref().trim_end_matches('/').to_string();
            ring.add(std::slice::from_ref(&peer));
            getters.insert(
                peer.clone(),
                Arc::new(HttpGetter {
                    base_url: format!("{}{}", peer, self.base_path),
                    client: self.client.clone(),
                    fetch: self.fetch,
                }),
            );
        }

        tracing::info!("[{}] cluster membership set to {} peer(s)", self.self_url, getters.len());
        *self.state.lock() = PoolState { ring, getters };
    }

    /// Builds the router serving the peer protocol under the base path.
    /// Anything under the base that is not `<group>/<key>` is a bad request.
    pub fn router(&self) -> Router {
        let base = format!("/{}", self.base_path.trim_matches('/'));
        Router::new().nest(
            &base,
            Router::new()
                .route("/:group/:key", get(handlers::handle_fetch))
                .fallback(handlers::handle_malformed_path),
        )
    }
}

impl PeerPicker for HttpPool {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>> {
        let state = self.state.lock();
        let owner = state.ring.get(key)?;
        if owner == self.self_url {
            return None;
        }

        tracing::debug!("[{}] key {} owned by peer {}", self.self_url, key, owner);
        state
            .getters
            .get(owner)
            .map(|getter| getter.clone() as Arc<dyn PeerGetter>)
    }
}

/// Client for a single remote peer.
pub struct HttpGetter {
    base_url: String,
    client: reqwest::Client,
    fetch: FetchConfig,
}

impl HttpGetter {
    /// Sends the request, retrying transport failures within the pool's
    /// fetch budget. Only send errors are retried: an HTTP error status is a
    /// definitive answer from the peer, and the caller's loader fallback
    /// handles it.
    async fn send_with_retry(&self, url: reqwest::Url) -> Result<reqwest::Response> {
        let mut last_error = None;

        for attempt in 1..=self.fetch.attempts {
            match self
                .client
                .get(url.clone())
                .timeout(self.fetch.timeout)
                .send()
                .await
            {
                Ok(response) => return Ok(response),
                Err(error) => {
                    tracing::debug!(
                        "fetch attempt {}/{} to {} failed: {}",
                        attempt,
                        self.fetch.attempts,
                        url,
                        error
                    );
                    last_error = Some(error);
                }
            }

            if attempt < self.fetch.attempts {
                tokio::time::sleep(self.backoff(attempt)).await;
            }
        }

        Err(match last_error {
            Some(error) => anyhow!(error).context(format!(
                "peer unreachable after {} attempt(s)",
                self.fetch.attempts
            )),
            None => anyhow!("fetch budget allows no attempts"),
        })
    }

    /// Backoff before the attempt following `attempt`: the base doubled per
    /// failure, capped, with a small random spread so peers hammered by many
    /// nodes at once see the retries staggered.
    fn backoff(&self, attempt: u32) -> Duration {
        use rand::Rng;

        let doublings = attempt.saturating_sub(1).min(10);
        let delay = self
            .fetch
            .base_backoff
            .saturating_mul(1 << doublings)
            .min(self.fetch.max_backoff);
        delay + Duration::from_millis(rand::thread_rng().gen_range(0..40))
    }
}

#[async_trait::async_trait]
impl PeerGetter for HttpGetter {
    async fn get(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("invalid peer base url {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("peer base url cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .push(&request.group)
            .push(&request.key);

        let response = self.send_with_retry(url).await?;

        if response.status() != reqwest::StatusCode::OK {
            bail!("server returned: {}", response.status());
        }

        let body = response
            .bytes()
            .await
            .context("reading peer response body")?;
        FetchResponse::decode(body).context("decoding peer response body")
    }
}
