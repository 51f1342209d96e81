//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the wildcard proxy handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Buffer inbound bodies for methods that carry one
//! - Dispatch to the forwarder and relay its result
//! - Graceful shutdown on Ctrl+C

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::{self, CredentialStore};
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::forward::{carries_body, Forwarder};
use crate::http::request::{UuidRequestId, X_REQUEST_ID};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
    pub max_body_bytes: usize,
}

/// HTTP server for the authenticating proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let store = Arc::new(CredentialStore::new());
        let authenticator = auth::from_config(&config.auth);
        let forwarder = Arc::new(Forwarder::new(
            config.upstream.clone(),
            &config.timeouts,
            store,
            authenticator,
        ));

        let state = AppState {
            forwarder,
            max_body_bytes: config.upstream.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.timeouts.request_secs,
                    )))
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler. Accepts any method on any path, buffers the body
/// when the method carries one, and hands off to the forwarder.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let (parts, body) = request.into_parts();
    let method = parts.method;
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path_and_query,
        "Proxying request"
    );

    let body_bytes = if carries_body(&method) {
        match axum::body::to_bytes(body, state.max_body_bytes).await {
            Ok(bytes) => Some(bytes),
            Err(_) => {
                let error = ProxyError::BodyTooLarge {
                    limit: state.max_body_bytes,
                };
                tracing::warn!(request_id = %request_id, error = %error, "Rejecting request");
                let response = error.into_response();
                metrics::record_request(method.as_str(), response.status().as_u16(), start);
                return response;
            }
        }
    } else {
        None
    };

    let response = match state
        .forwarder
        .forward(method.clone(), &path_and_query, body_bytes)
        .await
    {
        Ok(response) => response.into_response(),
        Err(error) => {
            tracing::error!(
                request_id = %request_id,
                method = %method,
                path = %path_and_query,
                error = %error,
                "Forwarding failed"
            );
            error.into_response()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
