//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, body buffering, middleware)
//!     → request.rs (request ID for correlation)
//!     → forward.rs (credential, upstream call, one-shot retry)
//!     → response.rs (failure mapping)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::Forwarder;
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
