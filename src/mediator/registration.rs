//! Startup registration with the orchestration platform.
//!
//! The proxy announces itself to an OpenHIM-compatible management API with
//! a static descriptor before it starts accepting traffic. A failed
//! registration is fatal: the caller terminates the process with a
//! non-zero exit code.

use serde::Serialize;

use crate::config::{MediatorConfig, ProxyConfig};

/// Registration descriptor, serialized the way the management API expects.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub urn: String,
    pub version: String,
    pub name: String,
    pub description: String,
    pub endpoints: Vec<Endpoint>,
}

/// One routable endpoint advertised to the platform.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Descriptor {
    /// Build the descriptor from configuration. The advertised port is the
    /// listener's; the path is the wildcard root every request enters on.
    pub fn from_config(config: &ProxyConfig) -> Self {
        let port = config
            .listener
            .bind_address
            .rsplit(':')
            .next()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Self {
            urn: config.mediator.urn.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            name: config.mediator.name.clone(),
            description: config.mediator.description.clone(),
            endpoints: vec![Endpoint {
                name: config.mediator.name.clone(),
                host: config.mediator.endpoint_host.clone(),
                port,
                path: "/".to_string(),
                kind: "http".to_string(),
            }],
        }
    }
}

/// Errors from the registration exchange.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("management API unreachable: {0}")]
    Network(#[from] reqwest::Error),

    #[error("management API rejected registration: status {status}")]
    Rejected { status: u16 },
}

/// Register the descriptor with the management API.
pub async fn register(
    config: &MediatorConfig,
    descriptor: &Descriptor,
) -> Result<(), RegistrationError> {
    let client = reqwest::Client::builder()
        .danger_accept_invalid_certs(config.trust_self_signed)
        .build()?;

    let url = format!("{}/mediators", config.api_url.trim_end_matches('/'));
    let response = client
        .post(&url)
        .basic_auth(&config.username, Some(&config.password))
        .json(descriptor)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(RegistrationError::Rejected {
            status: status.as_u16(),
        });
    }

    tracing::info!(urn = %descriptor.urn, url = %url, "Mediator registered");
    Ok(())
}
