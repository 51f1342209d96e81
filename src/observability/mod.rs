//! Observability subsystem.
//!
//! Structured logging is wired in `main` (tracing subscriber + EnvFilter);
//! this module carries the metrics side.

pub mod metrics;
