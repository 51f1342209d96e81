//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the authenticating proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Protected upstream API the proxy forwards to.
    pub upstream: UpstreamConfig,

    /// Identity provider login settings.
    pub auth: AuthConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Management-plane registration settings.
    pub mediator: MediatorConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Upstream API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the upstream (e.g., "http://127.0.0.1:4000").
    pub base_url: String,

    /// Fixed sub-path prepended to every inbound path.
    pub base_path: String,

    /// Maximum inbound body size buffered for forwarding, in bytes.
    pub max_body_bytes: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:4000".to_string(),
            base_path: "/fhir/DEFAULT".to_string(),
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Identity provider configuration, selected by `mode`.
///
/// The two modes differ in request shape and in the credential artifact
/// they produce: `session` yields an opaque cookie with no client-visible
/// expiry, `token` yields a bearer token with a known lifetime.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AuthConfig {
    /// JSON username/password login returning a session cookie.
    Session {
        /// Login endpoint URL.
        login_url: String,
        username: String,
        password: String,
        /// Name of the session cookie to extract from the login response.
        #[serde(default = "default_cookie_name")]
        cookie_name: String,
    },

    /// OAuth2 resource-owner-password-credentials token exchange.
    Token {
        /// Token endpoint URL.
        token_url: String,
        username: String,
        password: String,
        client_id: String,
        client_secret: String,
    },
}

fn default_cookie_name() -> String {
    "connect.sid".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::Session {
            login_url: "http://127.0.0.1:4000/auth/login".to_string(),
            username: String::new(),
            password: String::new(),
            cookie_name: default_cookie_name(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Management-plane registration configuration.
///
/// When enabled, the proxy registers itself with an OpenHIM-compatible
/// orchestration platform at startup; registration failure is fatal.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MediatorConfig {
    /// Enable registration at startup.
    pub enabled: bool,

    /// Management API base URL (e.g., "https://127.0.0.1:8082").
    pub api_url: String,

    /// Management API username.
    pub username: String,

    /// Management API password.
    pub password: String,

    /// Accept self-signed TLS certificates from the management API.
    pub trust_self_signed: bool,

    /// Mediator URN presented in the registration descriptor.
    pub urn: String,

    /// Human-readable mediator name.
    pub name: String,

    /// Mediator description.
    pub description: String,

    /// Hostname the platform should use to reach this proxy.
    pub endpoint_host: String,
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: "https://127.0.0.1:8082".to_string(),
            username: String::new(),
            password: String::new(),
            trust_self_signed: false,
            urn: "urn:mediator:fhir-auth-proxy".to_string(),
            name: "FHIR Auth Proxy".to_string(),
            description: "Authenticating pass-through mediator for a protected FHIR API"
                .to_string(),
            endpoint_host: "localhost".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_mode_parses() {
        let toml = r#"
            [listener]
            bind_address = "0.0.0.0:3000"

            [upstream]
            base_url = "http://gofr.example:4000"
            base_path = "/fhir/DEFAULT"

            [auth]
            mode = "session"
            login_url = "http://gofr.example:4000/auth/login"
            username = "root@gofr.org"
            password = "gofr"
        "#;
        let config: ProxyConfig = toml::from_str(toml).unwrap();
        match config.auth {
            AuthConfig::Session {
                login_url,
                cookie_name,
                ..
            } => {
                assert_eq!(login_url, "http://gofr.example:4000/auth/login");
                assert_eq!(cookie_name, "connect.sid");
            }
            other => panic!("expected session mode, got {:?}", other),
        }
        assert_eq!(config.upstream.base_path, "/fhir/DEFAULT");
    }

    #[test]
    fn token_mode_parses() {
        let toml = r#"
            [auth]
            mode = "token"
            token_url = "http://keycloak.example/token"
            username = "root@gofr.org"
            password = "gofr"
            client_id = "gofr-api"
            client_secret = "secret"
        "#;
        let config: ProxyConfig = toml::from_str(toml).unwrap();
        match config.auth {
            AuthConfig::Token {
                client_id,
                client_secret,
                ..
            } => {
                assert_eq!(client_id, "gofr-api");
                assert_eq!(client_secret, "secret");
            }
            other => panic!("expected token mode, got {:?}", other),
        }
    }

    #[test]
    fn defaults_cover_every_section() {
        let config: ProxyConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
        assert_eq!(config.upstream.max_body_bytes, 2 * 1024 * 1024);
        assert!(!config.mediator.enabled);
        assert!(!config.observability.metrics_enabled);
    }
}
