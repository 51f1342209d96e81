//! Credential state shared across in-flight requests.
//!
//! # Responsibilities
//! - Hold the current credential and judge its validity
//! - Serialize refresh so concurrent requests trigger exactly one login
//! - Survive caller disconnects: an in-flight login always completes and
//!   populates the store for the remaining waiters

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};

use super::{AuthError, Authenticator};
use crate::observability::metrics;

/// Margin subtracted from a token's advertised lifetime so it is refreshed
/// just before the wire expiry instead of guaranteeing a 401 on the boundary.
const EXPIRY_LEEWAY: Duration = Duration::from_secs(30);

/// How a credential is attached to outgoing upstream requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// Sent as a `Cookie: name=value` header.
    Cookie,
    /// Sent as an `Authorization: Bearer <token>` header.
    Bearer,
}

/// An authentication artifact obtained from the identity provider.
#[derive(Debug, Clone)]
pub struct Credential {
    /// Opaque cookie pair (`name=value`) or bearer token.
    pub value: String,
    pub kind: CredentialKind,
    /// `None` for cookies: their validity is discovered only by an upstream
    /// rejection.
    pub expires_at: Option<Instant>,
}

impl Credential {
    /// Session cookie credential with no client-visible expiry.
    pub fn cookie(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: CredentialKind::Cookie,
            expires_at: None,
        }
    }

    /// Bearer token credential expiring `expires_in` seconds from now.
    pub fn bearer(value: impl Into<String>, expires_in: Duration) -> Self {
        Self {
            value: value.into(),
            kind: CredentialKind::Bearer,
            expires_at: Some(Instant::now() + expires_in.saturating_sub(EXPIRY_LEEWAY)),
        }
    }

    /// Whether the credential can still be attached optimistically.
    pub fn is_valid(&self) -> bool {
        match self.expires_at {
            None => true,
            Some(deadline) => Instant::now() < deadline,
        }
    }
}

/// Shared holder for the current credential.
///
/// The slot is either absent or a complete [`Credential`]; no partial state
/// is ever observable. Refresh is funnelled through [`CredentialStore::fresh`],
/// which holds `refresh_lock` across the whole check-then-login sequence so
/// only one login is in flight at a time.
#[derive(Debug, Default)]
pub struct CredentialStore {
    slot: RwLock<Option<Credential>>,
    refresh_lock: Mutex<()>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current credential, valid or not.
    pub async fn get(&self) -> Option<Credential> {
        self.slot.read().await.clone()
    }

    /// Absent → false; bearer past its deadline → false; cookie → true.
    pub async fn is_valid(&self) -> bool {
        self.slot
            .read()
            .await
            .as_ref()
            .is_some_and(Credential::is_valid)
    }

    /// Replace the current credential.
    pub async fn set(&self, credential: Credential) {
        *self.slot.write().await = Some(credential);
    }

    /// Reset to absent.
    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }

    /// Reset to absent only if the slot still holds `rejected_value`.
    ///
    /// Used after an upstream 401: if another request already refreshed the
    /// store, the fresher credential must not be clobbered.
    pub async fn invalidate_rejected(&self, rejected_value: &str) {
        let mut slot = self.slot.write().await;
        if slot.as_ref().is_some_and(|c| c.value == rejected_value) {
            *slot = None;
        }
    }

    /// Return a credential valid at call time, logging in if necessary.
    ///
    /// Concurrent callers that find the slot invalid queue on the refresh
    /// lock; whichever acquires it first performs the login and the rest
    /// reuse the result on the re-check. The login itself runs on a spawned
    /// task so a caller that disconnects mid-refresh cannot cancel it out
    /// from under the other waiters.
    pub async fn fresh(
        self: &Arc<Self>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Result<Credential, AuthError> {
        if let Some(credential) = self.get().await.filter(Credential::is_valid) {
            return Ok(credential);
        }

        let _guard = self.refresh_lock.lock().await;

        // Re-check: a waiter ahead of us may have refreshed already.
        if let Some(credential) = self.get().await.filter(Credential::is_valid) {
            return Ok(credential);
        }

        tracing::debug!("No valid credential, logging in");

        let store = Arc::clone(self);
        let login = tokio::spawn(async move {
            let credential = authenticator.login().await?;
            store.set(credential.clone()).await;
            Ok::<_, AuthError>(credential)
        });

        let result = login.await.map_err(|_| AuthError::RefreshTask)?;
        metrics::record_auth_refresh(result.is_ok());
        match &result {
            Ok(credential) => tracing::info!(kind = ?credential.kind, "Credential refreshed"),
            Err(e) => tracing::warn!(error = %e, "Credential refresh failed"),
        }
        result
    }
}
