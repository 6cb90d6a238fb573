//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Generic acknowledgement for control operations (reload, stop, config write)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Status of a single proxy managed by the agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyStatus {
    pub name: String,
    #[serde(rename = "type")]
    pub proxy_type: String,
    pub status: String,
    #[serde(default)]
    pub err: String,
    #[serde(default)]
    pub local_addr: String,
    #[serde(default)]
    pub plugin: String,
    #[serde(default)]
    pub remote_addr: String,
}

impl ProxyStatus {
    pub fn new(
        name: impl Into<String>,
        proxy_type: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            proxy_type: proxy_type.into(),
            status: status.into(),
            err: String::new(),
            local_addr: String::new(),
            plugin: String::new(),
            remote_addr: String::new(),
        }
    }
}

/// Response body for GET /api/status, keyed by proxy type
pub type StatusResponse = BTreeMap<String, Vec<ProxyStatus>>;

/// Response body for the health endpoint (GET /healthz)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}
