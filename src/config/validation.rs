//! Semantic configuration checks.
//!
//! Serde handles the syntactic layer; these checks catch values that parse
//! but cannot work at runtime (unparseable addresses, empty credentials).

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::{AuthConfig, ProxyConfig};

/// A single failed semantic check.
#[derive(Debug)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g. "upstream.base_url").
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration, collecting every failure.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "listener.bind_address",
            message: format!("not a socket address: {:?}", config.listener.bind_address),
        });
    }

    check_url(&mut errors, "upstream.base_url", &config.upstream.base_url);
    if !config.upstream.base_path.is_empty() && !config.upstream.base_path.starts_with('/') {
        errors.push(ValidationError {
            field: "upstream.base_path",
            message: "must start with '/' or be empty".to_string(),
        });
    }

    match &config.auth {
        AuthConfig::Session {
            login_url,
            username,
            password,
            cookie_name,
        } => {
            check_url(&mut errors, "auth.login_url", login_url);
            check_non_empty(&mut errors, "auth.username", username);
            check_non_empty(&mut errors, "auth.password", password);
            check_non_empty(&mut errors, "auth.cookie_name", cookie_name);
        }
        AuthConfig::Token {
            token_url,
            username,
            password,
            client_id,
            ..
        } => {
            check_url(&mut errors, "auth.token_url", token_url);
            check_non_empty(&mut errors, "auth.username", username);
            check_non_empty(&mut errors, "auth.password", password);
            check_non_empty(&mut errors, "auth.client_id", client_id);
        }
    }

    if config.mediator.enabled {
        check_url(&mut errors, "mediator.api_url", &config.mediator.api_url);
        check_non_empty(&mut errors, "mediator.username", &config.mediator.username);
        check_non_empty(&mut errors, "mediator.password", &config.mediator.password);
        check_non_empty(&mut errors, "mediator.urn", &config.mediator.urn);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError {
            field: "observability.metrics_address",
            message: format!(
                "not a socket address: {:?}",
                config.observability.metrics_address
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError {
            field,
            message: format!("unsupported scheme {:?}", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError {
            field,
            message: format!("not a URL: {}", e),
        }),
    }
}

fn check_non_empty(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.is_empty() {
        errors.push(ValidationError {
            field,
            message: "must not be empty".to_string(),
        });
    }
}
