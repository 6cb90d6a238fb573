//! Agent Admin - Embedded admin control plane for a long-running agent
//!
//! Serves a health check, optional profiling endpoints, an authenticated
//! control API and a static dashboard from one HTTP listener.

pub mod api;
pub mod config;
pub mod control;
pub mod dashboard;
pub mod debug;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routing;
pub mod server;
pub mod tasks;

pub use config::{AdminConfig, Credentials};
pub use control::{AgentControl, FileAgent};
pub use debug::TraceRecorder;
pub use error::{AdminError, Result};
pub use routing::{Access, RouteTable, ALL_METHODS};
pub use server::{resolve_bind_address, AdminHandle, AdminServer, AdminService, ServerState};
