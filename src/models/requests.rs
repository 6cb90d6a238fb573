//! Request DTOs for the admin API
//!
//! Defines the structure of incoming query strings.

use serde::Deserialize;

/// Query string of the timed diagnostic captures (`?seconds=N`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaptureQuery {
    /// Raw value; anything that is not a positive integer falls back to the default
    #[serde(default)]
    pub seconds: Option<String>,
}

impl CaptureQuery {
    /// Returns the requested duration in seconds, or `default`.
    pub fn seconds_or(&self, default: u64) -> u64 {
        self.seconds
            .as_deref()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&secs| secs > 0)
            .unwrap_or(default)
    }
}
