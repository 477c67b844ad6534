//! Mock Vault servers for integration tests.
//!
//! Each server binds `127.0.0.1:0` and runs on the test runtime, so tests
//! can run in parallel without port clashes.

#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::IntoResponse;
use tokio::net::TcpListener;

use vaultkv_client::{VaultClient, VaultConfig};

/// Preflight body in the shape Vault returns: mount fields nested in `data`.
pub const PREFLIGHT_KV2: &str = r#"{"request_id":"0","lease_id":"0","renewable":false,"lease_duration":0,"data":{"accessor":"0","config":{"default_lease_ttl":0,"force_no_cache":false,"max_lease_ttl":0},"description":"","local":false,"options":{"version":"2"},"path":"secret","seal_wrap":false,"type":"kv"}}"#;

pub const PREFLIGHT_KV1: &str = r#"{"data":{"type":"kv"},"path":"kv","options":null}"#;

/// Serve `router` on an ephemeral port and return its address.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock vault");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn client(addr: SocketAddr, namespace: Option<&str>) -> VaultClient {
    let mut builder = VaultConfig::builder(format!("http://{addr}"))
        .token("mock_token")
        .open_timeout(Duration::from_secs(2))
        .read_timeout(Duration::from_secs(5));
    if let Some(ns) = namespace {
        builder = builder.namespace(ns);
    }
    VaultClient::new(builder.build().unwrap()).unwrap()
}

// ── Retries mock ─────────────────────────────────────────────────────

/// Answers the first request (the preflight) with a v2 mount, the next
/// `failure_count` requests with 500, and everything after that with
/// `mock_status` and `mock_body`.
pub struct RetriesMockVault {
    failure_count: usize,
    mock_status: StatusCode,
    mock_body: String,
    preflight: &'static str,
    hits: AtomicUsize,
    seen: Mutex<Vec<(Method, String)>>,
}

impl RetriesMockVault {
    pub fn new(failure_count: usize, mock_status: u16, mock_body: &str) -> Arc<Self> {
        Self::with_preflight(failure_count, mock_status, mock_body, PREFLIGHT_KV2)
    }

    pub fn with_preflight(
        failure_count: usize,
        mock_status: u16,
        mock_body: &str,
        preflight: &'static str,
    ) -> Arc<Self> {
        Arc::new(Self {
            failure_count,
            mock_status: StatusCode::from_u16(mock_status).unwrap(),
            mock_body: mock_body.to_owned(),
            preflight,
            hits: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub async fn start(self: &Arc<Self>) -> SocketAddr {
        serve(Router::new().fallback(retries_handler).with_state(Arc::clone(self))).await
    }

    /// Total requests received, preflight included.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Method and path-and-query of every request, in arrival order.
    pub fn seen(&self) -> Vec<(Method, String)> {
        self.seen.lock().unwrap().clone()
    }
}

async fn retries_handler(
    State(mock): State<Arc<RetriesMockVault>>,
    method: Method,
    uri: Uri,
) -> impl IntoResponse {
    let path = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_owned(), ToString::to_string);
    mock.seen.lock().unwrap().push((method, path));

    let n = mock.hits.fetch_add(1, Ordering::SeqCst);
    let (status, body) = if n == 0 {
        (StatusCode::OK, mock.preflight.to_owned())
    } else if n <= mock.failure_count {
        (StatusCode::INTERNAL_SERVER_ERROR, String::new())
    } else {
        (mock.mock_status, mock.mock_body.clone())
    };
    (status, [(header::CONTENT_TYPE, "application/json")], body)
}

// ── Header-validating mock ───────────────────────────────────────────

type HeaderCheck = dyn Fn(&HeaderMap) -> bool + Send + Sync;

/// Answers 200 with a v1 preflight and `{"data":{"value":"ok"}}` to any
/// request whose headers pass `check`, 400 otherwise.
pub async fn header_validating_vault(check: Arc<HeaderCheck>) -> SocketAddr {
    async fn handler(
        State(check): State<Arc<HeaderCheck>>,
        headers: HeaderMap,
        uri: Uri,
    ) -> impl IntoResponse {
        if !check(&headers) {
            return (StatusCode::BAD_REQUEST, String::new());
        }
        if uri.path().starts_with("/v1/sys/internal/ui/mounts/") {
            (StatusCode::OK, PREFLIGHT_KV1.to_owned())
        } else {
            (StatusCode::OK, r#"{"data":{"value":"ok"}}"#.to_owned())
        }
    }

    serve(Router::new().fallback(handler).with_state(check)).await
}
