//! Top-level error taxonomy for the forwarding path.
//!
//! Every failure here is resolved at the request boundary: it becomes a
//! 500-class response to the inbound caller and never crashes the process.
//! Startup failures (config, registration, bind) are handled in `main`.

use crate::auth::AuthError;

/// Errors produced while forwarding a single inbound request.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The identity provider rejected our credentials or returned an
    /// unusable response.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Transport-level failure reaching the upstream. Never retried.
    #[error("upstream unreachable: {0}")]
    Upstream(String),

    /// The inbound body exceeded the configured buffering limit.
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// The upstream request could not be built (malformed URI or header).
    #[error("invalid upstream request: {0}")]
    Request(String),
}
