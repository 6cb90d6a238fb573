//! Agent Control Module
//!
//! The seam between the admin API and the agent it manages. The admin server
//! only knows this trait; what reload or stop actually do is up to the agent.

mod file;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::StatusResponse;

pub use file::FileAgent;

/// Operations the admin API can trigger on the running agent.
#[async_trait]
pub trait AgentControl: Send + Sync + 'static {
    /// Re-reads the agent configuration and applies it.
    async fn reload(&self) -> Result<()>;

    /// Asks the agent to stop. Returns once the request is accepted.
    async fn stop(&self) -> Result<()>;

    /// Current status of every proxy, keyed by proxy type.
    async fn status(&self) -> Result<StatusResponse>;

    /// Raw content of the agent configuration.
    async fn config(&self) -> Result<String>;

    /// Replaces the agent configuration with `content`.
    async fn put_config(&self, content: String) -> Result<()>;
}
