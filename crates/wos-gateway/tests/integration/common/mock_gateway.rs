//! Mock API gateway for integration tests.
//!
//! Serves a handful of fixed routes on an ephemeral port and records every
//! request it receives:
//! - `GET /portfolio/summary` -> 200 with a JSON payload
//! - `POST /brokerage/trade`, `POST /risk/kill-switch` -> echo of body
//! - `GET /flaky` -> always 500
//! - `GET /recovering` -> 503 once, then 200
//! - `GET /expired` -> 401
//! - `GET /busy` -> 429 with `Retry-After: 5`
//! - `GET /slow` -> 200 after 500ms

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// A request as seen by the mock server.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Clone, Default)]
struct ServerState {
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl ServerState {
    /// Store the request; returns how many times its path has been hit.
    fn record(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: Option<Value>,
    ) -> usize {
        let mut requests = self.requests.lock();
        requests.push(Recorded {
            method: method.to_string(),
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            headers: headers.clone(),
            body,
        });
        requests.iter().filter(|r| r.path == uri.path()).count()
    }
}

/// A mock gateway server for testing.
pub struct MockGateway {
    addr: SocketAddr,
    state: ServerState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockGateway {
    /// Start the server on an available port.
    pub async fn start() -> Self {
        let state = ServerState::default();
        let app = Router::new()
            .route("/portfolio/summary", get(summary))
            .route("/brokerage/trade", post(echo))
            .route("/risk/kill-switch", post(echo))
            .route("/flaky", get(flaky))
            .route("/recovering", get(recovering))
            .route("/expired", get(expired))
            .route("/busy", get(busy))
            .route("/slow", get(slow))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Base URL to configure the client with.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().clone()
    }

    /// Number of requests received for `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.state
            .requests
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn summary(
    State(state): State<ServerState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.record(&method, &uri, &headers, None);
    Json(json!({"total_value": 1250000, "positions": [{"symbol": "AAPL", "qty": 10}]}))
}

async fn echo(
    State(state): State<ServerState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.record(&method, &uri, &headers, Some(body.clone()));
    Json(json!({"accepted": true, "echo": body}))
}

async fn flaky(
    State(state): State<ServerState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.record(&method, &uri, &headers, None);
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
}

async fn recovering(
    State(state): State<ServerState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> axum::response::Response {
    let hit = state.record(&method, &uri, &headers, None);
    if hit == 1 {
        (StatusCode::SERVICE_UNAVAILABLE, "warming up").into_response()
    } else {
        Json(json!({"status": "ok"})).into_response()
    }
}

async fn expired(
    State(state): State<ServerState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.record(&method, &uri, &headers, None);
    (StatusCode::UNAUTHORIZED, "token expired")
}

async fn busy(
    State(state): State<ServerState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.record(&method, &uri, &headers, None);
    (
        StatusCode::TOO_MANY_REQUESTS,
        [("Retry-After", "5")],
        "slow down",
    )
}

async fn slow(
    State(state): State<ServerState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.record(&method, &uri, &headers, None);
    tokio::time::sleep(Duration::from_millis(500)).await;
    Json(json!({"late": true}))
}
