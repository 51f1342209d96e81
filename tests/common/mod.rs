//! Shared mock servers for integration tests: a scriptable upstream that
//! records every request it sees, and the two identity provider shapes.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use tokio::net::TcpListener;

use fhir_auth_proxy::config::{AuthConfig, ProxyConfig};
use fhir_auth_proxy::http::HttpServer;

/// One request as observed by the mock upstream.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path_and_query: String,
    pub cookie: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Handle onto the mock upstream's observations.
#[derive(Clone, Default)]
pub struct Upstream {
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
    script: Arc<Mutex<VecDeque<(StatusCode, &'static str)>>>,
}

impl Upstream {
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a mock upstream that answers with the scripted responses in order,
/// then with `200 {"resourceType":"Bundle"}` once the script runs dry.
pub async fn spawn_upstream(script: Vec<(StatusCode, &'static str)>) -> (SocketAddr, Upstream) {
    let state = Upstream {
        requests: Arc::new(Mutex::new(Vec::new())),
        script: Arc::new(Mutex::new(VecDeque::from(script))),
    };

    let app = Router::new()
        .fallback(upstream_handler)
        .with_state(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

async fn upstream_handler(
    State(state): State<Upstream>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    state.requests.lock().unwrap().push(RecordedRequest {
        method,
        path_and_query: uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_default(),
        cookie: header_str(header::COOKIE),
        authorization: header_str(header::AUTHORIZATION),
        content_type: header_str(header::CONTENT_TYPE),
        body,
    });

    let (status, body) = state
        .script
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((StatusCode::OK, r#"{"resourceType":"Bundle"}"#));
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

#[derive(Clone)]
struct IdpState {
    logins: Arc<AtomicU32>,
    delay: Duration,
    expires_in: u64,
}

/// Start a session-login identity provider. Each login answers with a
/// distinct cookie value (`connect.sid=s1`, `s2`, ...) so tests can see
/// which credential a forwarded request carried.
pub async fn spawn_session_idp(delay: Duration) -> (SocketAddr, Arc<AtomicU32>) {
    let logins = Arc::new(AtomicU32::new(0));
    let state = IdpState {
        logins: logins.clone(),
        delay,
        expires_in: 0,
    };

    let app = Router::new()
        .route("/auth/login", post(session_login_handler))
        .with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, logins)
}

async fn session_login_handler(State(state): State<IdpState>) -> Response {
    tokio::time::sleep(state.delay).await;
    let n = state.logins.fetch_add(1, Ordering::SeqCst) + 1;
    let cookie = format!("connect.sid=s{}; Path=/; HttpOnly", n);
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(serde_json::json!({ "status": "ok" })),
    )
        .into_response()
}

/// Start a password-grant identity provider. Tokens are `tok-1`, `tok-2`,
/// ... with the configured lifetime.
pub async fn spawn_token_idp(expires_in: u64) -> (SocketAddr, Arc<AtomicU32>) {
    let logins = Arc::new(AtomicU32::new(0));
    let state = IdpState {
        logins: logins.clone(),
        delay: Duration::ZERO,
        expires_in,
    };

    let app = Router::new()
        .route("/token", post(token_handler))
        .with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, logins)
}

async fn token_handler(State(state): State<IdpState>) -> Response {
    let n = state.logins.fetch_add(1, Ordering::SeqCst) + 1;
    Json(serde_json::json!({
        "access_token": format!("tok-{}", n),
        "expires_in": state.expires_in,
        "token_type": "Bearer",
    }))
    .into_response()
}

pub fn session_auth(idp: SocketAddr) -> AuthConfig {
    AuthConfig::Session {
        login_url: format!("http://{}/auth/login", idp),
        username: "root@gofr.org".to_string(),
        password: "gofr".to_string(),
        cookie_name: "connect.sid".to_string(),
    }
}

pub fn token_auth(idp: SocketAddr) -> AuthConfig {
    AuthConfig::Token {
        token_url: format!("http://{}/token", idp),
        username: "root@gofr.org".to_string(),
        password: "gofr".to_string(),
        client_id: "gofr-api".to_string(),
        client_secret: "secret".to_string(),
    }
}

pub fn proxy_config(upstream: SocketAddr, auth: AuthConfig) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.upstream.base_url = format!("http://{}", upstream);
    config.upstream.base_path = "/fhir/DEFAULT".to_string();
    config.auth = auth;
    config
}

/// Start the proxy on an ephemeral port and return its address.
pub async fn spawn_proxy(config: ProxyConfig) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config);
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });
    addr
}

/// HTTP client that ignores any ambient proxy configuration.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
