//! Middleware Module
//!
//! Request gating shared by the admin routes.
//!
//! # Layers
//! - Auth gate: HTTP Basic credentials with a fixed delay on failure
//! - CORS wrapper: origin reflection and preflight short-circuit

pub mod auth;
pub mod cors;


pub use auth::{require_credentials, AuthGate};
pub use cors::reflect_origin;
