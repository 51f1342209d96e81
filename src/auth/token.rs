//! OAuth2 resource-owner-password-credentials login.
//!
//! Posts a form-encoded password grant to the token endpoint and turns the
//! `access_token`/`expires_in` pair into a time-bounded bearer credential,
//! so expiry is computed proactively instead of being discovered via 401.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{AuthError, Authenticator, Credential};

pub struct PasswordGrant {
    client: reqwest::Client,
    token_url: String,
    username: String,
    password: String,
    client_id: String,
    client_secret: String,
}

impl PasswordGrant {
    pub fn new(
        token_url: String,
        username: String,
        password: String,
        client_id: String,
        client_secret: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            token_url,
            username,
            password,
            client_id,
            client_secret,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[async_trait]
impl Authenticator for PasswordGrant {
    async fn login(&self) -> Result<Credential, AuthError> {
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "password"),
                ("username", &self.username),
                ("password", &self.password),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Provider {
                status: status.as_u16(),
            });
        }

        let token: TokenResponse = response.json().await.map_err(|_| AuthError::MissingToken)?;
        if token.access_token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        Ok(Credential::bearer(
            token.access_token,
            Duration::from_secs(token.expires_in),
        ))
    }
}
