//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use agent_admin::{
    models::{ProxyStatus, StatusResponse},
    AdminConfig, AdminService, AgentControl, AdminServer, Credentials, Result,
};
use async_trait::async_trait;
use axum::body::Body;
use base64::Engine;
use parking_lot::Mutex;

pub const USER: &str = "admin";
pub const PASSWORD: &str = "s3cret";

/// Agent that counts every control call it receives.
#[derive(Default)]
pub struct RecordingAgent {
    pub reloads: AtomicUsize,
    pub stops: AtomicUsize,
    pub config: Mutex<String>,
}

impl RecordingAgent {
    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentControl for RecordingAgent {
    async fn reload(&self) -> Result<()> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn status(&self) -> Result<StatusResponse> {
        let mut status = StatusResponse::new();
        status.insert(
            "tcp".to_string(),
            vec![ProxyStatus::new("ssh", "tcp", "running")],
        );
        Ok(status)
    }

    async fn config(&self) -> Result<String> {
        Ok(self.config.lock().clone())
    }

    async fn put_config(&self, content: String) -> Result<()> {
        *self.config.lock() = content;
        Ok(())
    }
}

/// Config with credentials set and profiling disabled.
pub fn locked_config() -> AdminConfig {
    AdminConfig::default().with_credentials(Credentials::new(USER, PASSWORD))
}

pub fn build_service(config: AdminConfig, agent: Arc<RecordingAgent>) -> AdminService {
    AdminServer::new(config, agent).into_service().unwrap()
}

pub fn basic_auth(user: &str, password: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{password}"));
    format!("Basic {encoded}")
}

pub fn valid_auth() -> String {
    basic_auth(USER, PASSWORD)
}

pub async fn body_to_bytes(body: Body) -> Vec<u8> {
    axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

/// Lower bound the auth gate must hold a rejected request for.
pub const AUTH_FAIL_DELAY: Duration = Duration::from_millis(200);
