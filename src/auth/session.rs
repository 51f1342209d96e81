//! Session-cookie login.
//!
//! Posts the configured username/password as JSON and extracts the session
//! cookie from the response's `Set-Cookie` headers. The resulting credential
//! has no client-visible expiry; it stays in use until the upstream rejects
//! it.

use async_trait::async_trait;
use reqwest::header::SET_COOKIE;

use super::{AuthError, Authenticator, Credential};

pub struct SessionLogin {
    client: reqwest::Client,
    login_url: String,
    username: String,
    password: String,
    cookie_name: String,
}

impl SessionLogin {
    pub fn new(
        login_url: String,
        username: String,
        password: String,
        cookie_name: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            login_url,
            username,
            password,
            cookie_name,
        }
    }
}

#[async_trait]
impl Authenticator for SessionLogin {
    async fn login(&self) -> Result<Credential, AuthError> {
        let response = self
            .client
            .post(&self.login_url)
            .json(&serde_json::json!({
                "username": self.username,
                "password": self.password,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Provider {
                status: status.as_u16(),
            });
        }

        let cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok());
        let pair = extract_cookie(cookies, &self.cookie_name).ok_or_else(|| {
            AuthError::MissingCookie {
                name: self.cookie_name.clone(),
            }
        })?;

        Ok(Credential::cookie(pair))
    }
}

/// Find the named cookie among `Set-Cookie` header values and return its
/// bare `name=value` pair, attributes stripped.
fn extract_cookie<'a>(
    set_cookie_values: impl Iterator<Item = &'a str>,
    name: &str,
) -> Option<String> {
    let prefix = format!("{}=", name);
    for raw in set_cookie_values {
        let pair = raw.split(';').next()?.trim();
        if pair.starts_with(&prefix) {
            return Some(pair.to_string());
        }
    }
    None
}
