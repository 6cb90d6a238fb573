//! API Module
//!
//! HTTP handlers and route registration for the admin control API.
//!
//! # Endpoints
//! - `/healthz` - Health check, no credentials required
//! - `GET /api/reload` - Reload the agent configuration
//! - `POST /api/stop` - Stop the agent
//! - `GET /api/status` - Proxy status report
//! - `GET|PUT /api/config` - Read or replace the raw configuration

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::{register_api_routes, register_health_route};
