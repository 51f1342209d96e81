//! Management-plane registration subsystem.
//!
//! Out of the proxy's hot path entirely: one registration call at startup,
//! fatal on failure, nothing afterwards.

pub mod registration;

pub use registration::{register, Descriptor, RegistrationError};
