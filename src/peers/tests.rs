use super::http::HttpPool;
use super::protocol::{FetchRequest, FetchResponse};
use super::{PeerGetter, PeerPicker};
use crate::group::registry;
use anyhow::anyhow;
use prost::Message;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Loader that serves a derived value for any key and counts invocations.
fn counting_loader(
    loads: Arc<AtomicUsize>,
) -> impl Fn(String) -> std::pin::Pin<Box<dyn Future<Output = anyhow::Result<Vec<u8>>> + Send>>
+ Send
+ Sync
+ 'static {
    move |key: String| {
        let loads = loads.clone();
        Box::pin(async move {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok(format!("value-{}", key).into_bytes())
        })
    }
}

async fn start_server(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    url
}

/// Reserves an address nothing listens on.
fn dead_peer_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    format!("http://{}", listener.local_addr().unwrap())
}

// ============================================================
// WIRE CODEC
// ============================================================

#[test]
fn test_fetch_request_wire_layout() {
    let request = FetchRequest {
        group: "scores".to_string(),
        key: "Tom".to_string(),
    };

    // Field 1 (group) and field 2 (key), both length-delimited strings.
    let mut expected = vec![0x0a, 0x06];
    expected.extend_from_slice(b"scores");
    expected.extend_from_slice(&[0x12, 0x03]);
    expected.extend_from_slice(b"Tom");

    assert_eq!(request.encode_to_vec(), expected);
}

#[test]
fn test_fetch_response_wire_layout() {
    let response = FetchResponse {
        value: b"630".to_vec(),
    };

    let mut expected = vec![0x0a, 0x03];
    expected.extend_from_slice(b"630");
    assert_eq!(response.encode_to_vec(), expected);
}

#[test]
fn test_absent_fields_decode_to_defaults() {
    let request = FetchRequest::decode(&[][..]).unwrap();
    assert_eq!(request.group, "");
    assert_eq!(request.key, "");

    let response = FetchResponse::decode(&[][..]).unwrap();
    assert!(response.value.is_empty());
}

// ============================================================
// PEER PICKING
// ============================================================

#[tokio::test]
async fn test_pick_peer_skips_self_and_empty_ring() {
    let pool = HttpPool::new("http://127.0.0.1:7001");

    // No membership yet.
    assert!(pool.pick_peer("anything").is_none());

    // Single-node cluster: every key is owned locally.
    pool.set_peers(&["http://127.0.0.1:7001"]);
    assert!(pool.pick_peer("anything").is_none());
}

#[tokio::test]
async fn test_pick_peer_routes_to_remote_owner() {
    let pool = HttpPool::new("http://127.0.0.1:7001");
    pool.set_peers(&["http://127.0.0.1:7001", "http://127.0.0.1:7002"]);

    // With two peers and 50 virtual nodes each, some keys must land on the
    // remote one.
    let remote_owned = (0..200)
        .map(|i| format!("key-{}", i))
        .filter(|key| pool.pick_peer(key).is_some())
        .count();
    assert!(remote_owned > 0);
}

// ============================================================
// HTTP SERVER CONTRACT
// ============================================================

#[tokio::test]
async fn test_server_contract_statuses_and_bodies() {
    let loads = Arc::new(AtomicUsize::new(0));
    let inner = loads.clone();
    registry::new_group("peers-http-scores", 2 << 10, move |key: String| {
        let loads = inner.clone();
        async move {
            loads.fetch_add(1, Ordering::SeqCst);
            match key.as_str() {
                "Tom" => Ok(b"630".to_vec()),
                other => Err(anyhow!("{} not exist", other)),
            }
        }
    });

    let pool = HttpPool::new("http://127.0.0.1:0");
    let url = start_server(pool.router()).await;

    // Known group and key: octet-stream body carrying the encoded value.
    let response = reqwest::get(format!("{}/_peercache/peers-http-scores/Tom", url))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers()[reqwest::header::CONTENT_TYPE],
        "application/octet-stream"
    );
    let decoded = FetchResponse::decode(response.bytes().await.unwrap()).unwrap();
    assert_eq!(decoded.value, b"630");

    // Unknown group.
    let response = reqwest::get(format!("{}/_peercache/nosuchgroup/Tom", url))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    assert_eq!(response.text().await.unwrap(), "no such group: nosuchgroup");

    // Loader failure surfaces as a 500 with the error text.
    let response = reqwest::get(format!("{}/_peercache/peers-http-scores/Zed", url))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.text().await.unwrap().contains("Zed not exist"));

    // Malformed shapes under the base path.
    let response = reqwest::get(format!("{}/_peercache/onlyonesegment", url))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

// ============================================================
// REMOTE FETCH AND FALLBACK
// ============================================================

#[tokio::test]
async fn test_fetch_from_owning_peer_loads_once() {
    let loads = Arc::new(AtomicUsize::new(0));
    let group = registry::new_group_with_policy(
        "peers-remote-scores",
        crate::store::cache::CachePolicy::Lru { max_bytes: 2 << 10 },
        crate::group::loader(counting_loader(loads.clone())),
    );

    // The owner node: a single-peer cluster serving the group over HTTP.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let owner_url = format!("http://{}", listener.local_addr().unwrap());
    let owner_pool = HttpPool::new(&owner_url);
    owner_pool.set_peers(&[owner_url.clone()]);
    group.register_peers(owner_pool.clone());
    let router = owner_pool.router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    // A second node that owns nothing: it routes fetches to the owner.
    let local_url = "http://127.0.0.1:1";
    let local_pool = HttpPool::new(local_url);
    local_pool.set_peers(&[local_url.to_string(), owner_url.clone()]);

    let key = (0..400)
        .map(|i| format!("key-{}", i))
        .find(|key| local_pool.pick_peer(key).is_some())
        .expect("some key must be owned by the remote peer");

    let getter = local_pool.pick_peer(&key).unwrap();
    let request = FetchRequest {
        group: "peers-remote-scores".to_string(),
        key: key.clone(),
    };

    let response = getter.get(&request).await.unwrap();
    assert_eq!(response.value, format!("value-{}", key).into_bytes());
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    // The owner cached the value, so a second fetch does not hit the loader.
    let response = getter.get(&request).await.unwrap();
    assert_eq!(response.value, format!("value-{}", key).into_bytes());
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unreachable_peer_falls_back_to_local_loader() {
    let loads = Arc::new(AtomicUsize::new(0));
    let group = registry::new_group_with_policy(
        "peers-fallback-scores",
        crate::store::cache::CachePolicy::Lru { max_bytes: 2 << 10 },
        crate::group::loader(counting_loader(loads.clone())),
    );

    let self_url = "http://127.0.0.1:1";
    let dead_url = dead_peer_url();
    let pool = HttpPool::new(self_url);
    pool.set_peers(&[self_url.to_string(), dead_url]);
    group.register_peers(pool.clone());

    // A key the dead peer owns forces the peer path first.
    let key = (0..400)
        .map(|i| format!("key-{}", i))
        .find(|key| pool.pick_peer(key).is_some())
        .expect("some key must be owned by the dead peer");

    let view = group.get(&key).await.unwrap();
    assert_eq!(view.byte_slice(), format!("value-{}", key).into_bytes());
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    // The fallback populated the local store.
    assert_eq!(group.cache_len(), 1);
    let view = group.get(&key).await.unwrap();
    assert_eq!(view.byte_slice(), format!("value-{}", key).into_bytes());
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}
