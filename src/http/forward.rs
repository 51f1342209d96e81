//! Upstream forwarding and the one-shot retry policy.
//!
//! # Responsibilities
//! - Ensure a valid credential exists before every upstream call
//! - Rebase the inbound path onto the upstream base path, verbatim
//! - Attach the credential as `Cookie` or `Authorization: Bearer`
//! - Retry exactly once when the upstream answers 401
//!
//! # Design Decisions
//! - Non-2xx upstream statuses are business responses, relayed verbatim
//! - Transport failures map to 502 and are never retried
//! - The retry is modeled as an explicit two-state machine so the
//!   "no second retry" bound is visible in the control flow

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, Method, Request, Response, StatusCode, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::auth::{Authenticator, Credential, CredentialKind, CredentialStore};
use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::error::ProxyError;

/// Retry progression for one logical inbound request.
///
/// `Retried` is terminal: whatever the second attempt yields goes back to
/// the caller, including another 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    Retried,
}

/// Whether a method semantically carries a request body.
///
/// The forwarded body and its `Content-Type` are attached for these methods
/// only; a GET or DELETE never grows a body in transit.
pub fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Forwards inbound requests to the upstream with a credential attached.
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    upstream: UpstreamConfig,
    store: Arc<CredentialStore>,
    authenticator: Arc<dyn Authenticator>,
}

impl Forwarder {
    pub fn new(
        upstream: UpstreamConfig,
        timeouts: &TimeoutConfig,
        store: Arc<CredentialStore>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            upstream,
            store,
            authenticator,
        }
    }

    /// Forward one inbound request, authenticating on demand.
    ///
    /// `path_and_query` is the inbound path plus query string, preserved
    /// verbatim; `body` is the buffered inbound body for methods that carry
    /// one.
    pub async fn forward(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<Bytes>,
    ) -> Result<Response<Body>, ProxyError> {
        let mut attempt = Attempt::First;
        let mut credential = self
            .store
            .fresh(Arc::clone(&self.authenticator))
            .await?;

        loop {
            let request = self.build_request(&method, path_and_query, body.as_ref(), &credential)?;
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| ProxyError::Upstream(e.to_string()))?;

            if response.status() == StatusCode::UNAUTHORIZED && attempt == Attempt::First {
                tracing::info!(
                    method = %method,
                    path = %path_and_query,
                    "Upstream rejected credential, re-authenticating"
                );
                self.store.invalidate_rejected(&credential.value).await;
                credential = self
                    .store
                    .fresh(Arc::clone(&self.authenticator))
                    .await?;
                attempt = Attempt::Retried;
                continue;
            }

            let (parts, body) = response.into_parts();
            return Ok(Response::from_parts(parts, Body::new(body)));
        }
    }

    /// Build the upstream request for one attempt. Deterministic apart from
    /// the credential header, which is swapped on retry.
    fn build_request(
        &self,
        method: &Method,
        path_and_query: &str,
        body: Option<&Bytes>,
        credential: &Credential,
    ) -> Result<Request<Body>, ProxyError> {
        let uri: Uri = format!(
            "{}{}{}",
            self.upstream.base_url.trim_end_matches('/'),
            self.upstream.base_path,
            path_and_query
        )
        .parse()
        .map_err(|e: axum::http::uri::InvalidUri| ProxyError::Request(e.to_string()))?;

        let mut builder = Request::builder().method(method.clone()).uri(uri);

        builder = match credential.kind {
            CredentialKind::Cookie => builder.header(header::COOKIE, credential.value.as_str()),
            CredentialKind::Bearer => builder.header(
                header::AUTHORIZATION,
                format!("Bearer {}", credential.value),
            ),
        };

        let request = if carries_body(method) {
            builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.cloned().map(Body::from).unwrap_or_else(Body::empty))
        } else {
            builder.body(Body::empty())
        };

        request.map_err(|e| ProxyError::Request(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_rule_covers_write_methods_only() {
        assert!(carries_body(&Method::POST));
        assert!(carries_body(&Method::PUT));
        assert!(carries_body(&Method::PATCH));

        assert!(!carries_body(&Method::GET));
        assert!(!carries_body(&Method::HEAD));
        assert!(!carries_body(&Method::DELETE));
        assert!(!carries_body(&Method::OPTIONS));
    }
}
