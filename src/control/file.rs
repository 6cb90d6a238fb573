//! File-backed agent
//!
//! Keeps the agent configuration in a file on disk. Used by the binary to run
//! the admin server standalone.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::AgentControl;
use crate::error::{AdminError, Result};
use crate::models::{ProxyStatus, StatusResponse};

/// Status given to proxies declared in the file but not yet started.
pub const DECLARED_PROXY_STATUS: &str = "new";

// == Config File ==
/// The parts of the agent configuration the admin surface reports on.
///
/// Every other key of the file is ignored.
#[derive(Debug, Default, Deserialize)]
struct AgentFile {
    #[serde(default)]
    proxies: Vec<ProxyEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProxyEntry {
    name: String,
    #[serde(rename = "type")]
    proxy_type: String,
    #[serde(rename = "localIP", default = "default_local_ip")]
    local_ip: String,
    local_port: Option<u16>,
    remote_port: Option<u16>,
    plugin: Option<PluginEntry>,
}

#[derive(Debug, Deserialize)]
struct PluginEntry {
    #[serde(rename = "type")]
    kind: String,
}

fn default_local_ip() -> String {
    "127.0.0.1".to_string()
}

impl From<ProxyEntry> for ProxyStatus {
    fn from(entry: ProxyEntry) -> Self {
        let mut status = ProxyStatus::new(entry.name, entry.proxy_type, DECLARED_PROXY_STATUS);
        if let Some(port) = entry.local_port {
            status.local_addr = format!("{}:{port}", entry.local_ip);
        }
        if let Some(port) = entry.remote_port {
            status.remote_addr = format!(":{port}");
        }
        if let Some(plugin) = entry.plugin {
            status.plugin = plugin.kind;
        }
        status
    }
}

// == File Agent ==
pub struct FileAgent {
    config_path: PathBuf,
    proxies: RwLock<Vec<ProxyStatus>>,
    stop: CancellationToken,
}

impl FileAgent {
    /// Creates an agent reading its configuration from `config_path`.
    ///
    /// `stop` is cancelled when a stop is requested through the API.
    pub fn new(config_path: impl Into<PathBuf>, stop: CancellationToken) -> Self {
        Self {
            config_path: config_path.into(),
            proxies: RwLock::new(Vec::new()),
            stop,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Records the state of a proxy so it shows up in status reports.
    pub fn track_proxy(&self, proxy: ProxyStatus) {
        let mut proxies = self.proxies.write();
        proxies.retain(|p| p.name != proxy.name);
        proxies.push(proxy);
    }

    async fn read_config(&self) -> Result<String> {
        tokio::fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| {
                AdminError::Agent(format!(
                    "failed to read config file {}: {e}",
                    self.config_path.display()
                ))
            })
    }
}

#[async_trait]
impl AgentControl for FileAgent {
    /// Re-reads the file and replaces the reported proxies with the ones it
    /// declares.
    async fn reload(&self) -> Result<()> {
        let content = self.read_config().await?;
        if content.trim().is_empty() {
            return Err(AdminError::Agent(format!(
                "config file {} is empty",
                self.config_path.display()
            )));
        }

        let file: AgentFile = toml::from_str(&content).map_err(|e| {
            AdminError::Agent(format!(
                "invalid config file {}: {e}",
                self.config_path.display()
            ))
        })?;
        let proxies: Vec<ProxyStatus> = file.proxies.into_iter().map(ProxyStatus::from).collect();
        let count = proxies.len();
        *self.proxies.write() = proxies;

        info!(
            path = %self.config_path.display(),
            proxies = count,
            "configuration reloaded"
        );
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        info!("stop requested through admin API");
        self.stop.cancel();
        Ok(())
    }

    async fn status(&self) -> Result<StatusResponse> {
        let mut status = StatusResponse::new();
        for proxy in self.proxies.read().iter() {
            status
                .entry(proxy.proxy_type.clone())
                .or_default()
                .push(proxy.clone());
        }
        Ok(status)
    }

    async fn config(&self) -> Result<String> {
        self.read_config().await
    }

    async fn put_config(&self, content: String) -> Result<()> {
        tokio::fs::write(&self.config_path, content)
            .await
            .map_err(|e| {
                AdminError::Agent(format!(
                    "failed to write config file {}: {e}",
                    self.config_path.display()
                ))
            })?;
        info!(path = %self.config_path.display(), "configuration file updated");
        Ok(())
    }
}
