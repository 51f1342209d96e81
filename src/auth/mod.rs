//! Identity provider authentication subsystem.
//!
//! # Data Flow
//! ```text
//! forward request needs credential
//!     → credential.rs (store: valid? if not, serialize refresh)
//!     → session.rs | token.rs (login exchange, selected at startup)
//!     → Credential written back to the store
//!     → attached to the upstream request
//! ```
//!
//! # Design Decisions
//! - One `Authenticator` trait, two implementations; the forwarding path
//!   never knows which flavor is configured
//! - Login errors are surfaced to the caller as 500-class responses; the
//!   process never exits over a failed login

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::AuthConfig;

pub mod credential;
pub mod session;
pub mod token;

pub use credential::{Credential, CredentialKind, CredentialStore};
pub use session::SessionLogin;
pub use token::PasswordGrant;

/// Errors from a login exchange with the identity provider.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The provider answered with a non-2xx status.
    #[error("identity provider rejected login: status {status}")]
    Provider { status: u16 },

    /// The login response carried no cookie with the expected name.
    #[error("no {name:?} cookie in login response")]
    MissingCookie { name: String },

    /// The token response carried no usable `access_token`.
    #[error("no access_token in token response")]
    MissingToken,

    /// Transport-level failure reaching the provider.
    #[error("identity provider unreachable: {0}")]
    Network(#[from] reqwest::Error),

    /// The detached refresh task was aborted or panicked.
    #[error("credential refresh task failed")]
    RefreshTask,
}

/// A login exchange producing a fresh [`Credential`].
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self) -> Result<Credential, AuthError>;
}

/// Build the authenticator selected by configuration.
pub fn from_config(config: &AuthConfig) -> Arc<dyn Authenticator> {
    match config.clone() {
        AuthConfig::Session {
            login_url,
            username,
            password,
            cookie_name,
        } => Arc::new(SessionLogin::new(login_url, username, password, cookie_name)),
        AuthConfig::Token {
            token_url,
            username,
            password,
            client_id,
            client_secret,
        } => Arc::new(PasswordGrant::new(
            token_url,
            username,
            password,
            client_id,
            client_secret,
        )),
    }
}
