//! Agent Admin - standalone admin server
//!
//! Runs the admin server in front of a file-backed agent configuration.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_admin::{
    AdminConfig, AdminServer, AgentControl, FileAgent, ServerState, TraceRecorder,
};

const DEFAULT_AGENT_CONFIG_FILE: &str = "agent.toml";
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Main entry point for the admin server.
///
/// # Startup Sequence
/// 1. Initialize tracing with the execution trace recorder attached
/// 2. Load configuration from environment variables
/// 3. Bind the admin listener, failing fast if the address is taken
/// 4. Run until a signal, a stop request, or the serve loop exits
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let recorder = TraceRecorder::new();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agent_admin=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(recorder.clone())
        .init();

    let config = AdminConfig::from_env();
    info!(
        address = %config.address,
        pprof = config.pprof_enabled,
        "Configuration loaded"
    );

    let config_file =
        env::var("AGENT_CONFIG_FILE").unwrap_or_else(|_| DEFAULT_AGENT_CONFIG_FILE.to_string());
    let stop = CancellationToken::new();
    let agent = Arc::new(FileAgent::new(&config_file, stop.clone()));
    info!(path = %config_file, "Serving agent configuration");
    if let Err(e) = agent.reload().await {
        warn!(error = %e, "Agent configuration not loaded, status will be empty");
    }

    let handle = AdminServer::new(config, agent)
        .with_trace_recorder(recorder)
        .start()
        .context("failed to start admin server")?;
    let mut state = handle.subscribe();

    tokio::select! {
        _ = shutdown_signal() => {}
        _ = stop.cancelled() => {
            info!("Stop requested through admin API, shutting down...");
        }
        exited = state.wait_for(|s| *s != ServerState::Running) => {
            if let Ok(state) = exited {
                warn!(state = ?*state, "Admin server exited on its own");
            }
        }
    }

    handle
        .shutdown(SHUTDOWN_TIMEOUT)
        .await
        .context("admin server shutdown")?;
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
