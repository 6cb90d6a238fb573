//! API Handlers
//!
//! HTTP request handlers for the admin control endpoints. Each one delegates to
//! the agent through [`AgentControl`].

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::{info, warn};

use crate::control::AgentControl;
use crate::error::{AdminError, Result};
use crate::models::{HealthResponse, MessageResponse, StatusResponse};

/// Agent handle shared by all API handlers.
pub type SharedControl = Arc<dyn AgentControl>;

/// Handler for /healthz
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /api/reload
pub async fn reload_handler(
    State(control): State<SharedControl>,
) -> Result<Json<MessageResponse>> {
    control.reload().await.inspect_err(|e| {
        warn!(error = %e, "reload requested through admin API failed");
    })?;
    info!("success reload conf");
    Ok(Json(MessageResponse::new("reload success")))
}

/// Handler for POST /api/stop
pub async fn stop_handler(State(control): State<SharedControl>) -> Result<Json<MessageResponse>> {
    control.stop().await?;
    Ok(Json(MessageResponse::new("stopping")))
}

/// Handler for GET /api/status
pub async fn status_handler(State(control): State<SharedControl>) -> Result<Json<StatusResponse>> {
    Ok(Json(control.status().await?))
}

/// Handler for GET /api/config
pub async fn get_config_handler(
    State(control): State<SharedControl>,
) -> Result<impl IntoResponse> {
    let content = control.config().await?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        content,
    ))
}

/// Handler for PUT /api/config
///
/// The body replaces the agent configuration verbatim.
pub async fn put_config_handler(
    State(control): State<SharedControl>,
    body: String,
) -> Result<Json<MessageResponse>> {
    if body.is_empty() {
        return Err(AdminError::InvalidRequest("body can't be empty".to_string()));
    }

    control.put_config(body).await?;
    Ok(Json(MessageResponse::new("config updated")))
}

/// Fallback for unmatched admin paths
pub async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "404 page not found\n")
}
