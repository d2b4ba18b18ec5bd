use anyhow::anyhow;
use axum::extract::{Extension, Query};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::get};
use peercache::group::{Group, registry};
use peercache::peers::http::HttpPool;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use sysinfo::System;

/// Stand-in for a slow backing database, as in the classic demo: three users
/// with fixed scores.
fn create_group(max_bytes: usize) -> Arc<Group> {
    registry::new_group("scores", max_bytes, |key: String| async move {
        tracing::info!("[SlowDB] search key {}", key);
        match key.as_str() {
            "Tom" => Ok(b"630".to_vec()),
            "Jack" => Ok(b"589".to_vec()),
            "Sam" => Ok(b"567".to_vec()),
            other => Err(anyhow!("{} not exist", other)),
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut port: u16 = 8001;
    let mut api = false;
    let mut peers: Vec<String> = vec![];

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                port = args[i + 1].parse()?;
                i += 2;
            }
            "--api" => {
                api = true;
                i += 1;
            }
            "--peers" => {
                peers = args[i + 1]
                    .split(',')
                    .map(|peer| peer.trim().to_string())
                    .filter(|peer| !peer.is_empty())
                    .collect();
                i += 2;
            }
            "--help" => {
                eprintln!(
                    "Usage: {} [--port <port>] [--api] [--peers <url,url,...>]",
                    args[0]
                );
                eprintln!("Example: {} --port 8001 --api", args[0]);
                eprintln!(
                    "Example: {} --port 8002 --peers http://localhost:8001,http://localhost:8002",
                    args[0]
                );
                std::process::exit(0);
            }
            _ => {
                i += 1;
            }
        }
    }

    let self_url = format!("http://localhost:{}", port);
    if peers.is_empty() {
        // Default three-node local cluster, matching the demo scripts.
        peers = vec![8001, 8002, 8003]
            .into_iter()
            .map(|p| format!("http://localhost:{}", p))
            .collect();
    }

    let max_bytes = std::env::var("CACHE_MAX_BYTES")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(2 << 20);

    tracing::info!("Starting cache node {}", self_url);
    tracing::info!("Cluster peers: {:?}", peers);

    // 1. Namespace + loader:
    let group = create_group(max_bytes);

    // 2. Peer pool over the consistent-hash ring:
    let pool = HttpPool::new(&self_url);
    pool.set_peers(&peers);
    group.register_peers(pool.clone());

    let node_info = Arc::new(NodeInfo {
        self_url: self_url.clone(),
        peers: peers.clone(),
    });

    // 3. Optional client-facing API server:
    if api {
        let api_group = group.clone();
        tokio::spawn(async move {
            let app = Router::new()
                .route("/api", get(handle_api))
                .layer(Extension(api_group));
            let listener = match tokio::net::TcpListener::bind("127.0.0.1:9999").await {
                Ok(listener) => listener,
                Err(e) => {
                    tracing::error!("Failed to bind API server: {}", e);
                    return;
                }
            };
            tracing::info!("API server listening on http://localhost:9999");
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("API server failed: {}", e);
            }
        });
    }

    // 4. Cache server: peer protocol plus health endpoints.
    let app = pool
        .router()
        .route("/health/stats", get(handle_stats))
        .layer(Extension(node_info));

    let bind_addr = format!("127.0.0.1:{}", port);
    tracing::info!("Cache server listening on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Deserialize)]
struct ApiParams {
    key: String,
}

/// Client-facing read endpoint: `GET /api?key=Tom` returns the raw value.
async fn handle_api(
    Extension(group): Extension<Arc<Group>>,
    Query(params): Query<ApiParams>,
) -> Response {
    match group.get(&params.key).await {
        Ok(view) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            view.byte_slice(),
        )
            .into_response(),
        Err(error) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{error:#}")).into_response(),
    }
}

struct NodeInfo {
    self_url: String,
    peers: Vec<String>,
}

#[derive(Serialize)]
struct GroupStats {
    name: String,
    entries: usize,
}

#[derive(Serialize)]
struct NodeStatsResponse {
    self_url: String,
    peers: Vec<String>,
    groups: Vec<GroupStats>,
    cpu_usage: f32,
    mem_used_mb: u64,
    mem_total_mb: u64,
}

async fn handle_stats(Extension(info): Extension<Arc<NodeInfo>>) -> Json<NodeStatsResponse> {
    let groups = registry::list_groups()
        .into_iter()
        .map(|group| GroupStats {
            name: group.name().to_string(),
            entries: group.cache_len(),
        })
        .collect();

    let mut sys = System::new_all();
    sys.refresh_cpu();
    sys.refresh_memory();
    let cpu_usage = sys.global_cpu_info().cpu_usage();
    // sysinfo returns bytes for memory values.
    let mem_total_mb = sys.total_memory() / (1024 * 1024);
    let mem_used_mb = sys.used_memory() / (1024 * 1024);

    Json(NodeStatsResponse {
        self_url: info.self_url.clone(),
        peers: info.peers.clone(),
        groups,
        cpu_usage,
        mem_used_mb,
        mem_total_mb,
    })
}
