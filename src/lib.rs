//! Authenticating reverse proxy for a protected FHIR API.
//!
//! Sits between a generic HTTP client and an upstream that requires
//! authentication, obtains and refreshes a session cookie or bearer token
//! on the client's behalf, forwards every inbound request with the
//! credential attached, and relays the upstream response verbatim.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod mediator;
pub mod observability;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
