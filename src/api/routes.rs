//! API Routes
//!
//! Registers the admin endpoints on the route table.

use axum::http::Method;

use super::handlers::{
    get_config_handler, health_handler, put_config_handler, reload_handler, status_handler,
    stop_handler, SharedControl,
};
use crate::error::Result;
use crate::routing::{Access, RouteTable, ALL_METHODS};

/// Registers the health check, reachable without credentials.
pub fn register_health_route(table: &mut RouteTable) -> Result<()> {
    table.register("/healthz", ALL_METHODS, Access::Public, health_handler)?;
    Ok(())
}

/// Registers the control endpoints behind the auth gate.
///
/// # Endpoints
/// - `GET /api/reload` - Reload the agent configuration
/// - `POST /api/stop` - Stop the agent
/// - `GET /api/status` - Proxy status report
/// - `GET /api/config` - Read the raw configuration
/// - `PUT /api/config` - Replace the raw configuration
pub fn register_api_routes(table: &mut RouteTable, control: SharedControl) -> Result<()> {
    table
        .register_with_state(
            "/api/reload",
            &[Method::GET],
            Access::Protected,
            reload_handler,
            control.clone(),
        )?
        .register_with_state(
            "/api/stop",
            &[Method::POST],
            Access::Protected,
            stop_handler,
            control.clone(),
        )?
        .register_with_state(
            "/api/status",
            &[Method::GET],
            Access::Protected,
            status_handler,
            control.clone(),
        )?
        .register_with_state(
            "/api/config",
            &[Method::GET],
            Access::Protected,
            get_config_handler,
            control.clone(),
        )?
        .register_with_state(
            "/api/config",
            &[Method::PUT],
            Access::Protected,
            put_config_handler,
            control,
        )?;
    Ok(())
}
