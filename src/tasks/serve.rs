//! Serve Loop Task
//!
//! Background task that accepts admin connections until its cancellation token
//! fires, then publishes how it ended.

use axum::ServiceExt as _;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::server::{AdminService, ServerState};

/// Spawns the accept/serve loop for `service` on `listener`.
///
/// The loop drains in-flight requests once `shutdown` is cancelled. Its exit is
/// published on `state`: `Stopped` when shutdown was requested, `Failed`
/// otherwise.
///
/// # Returns
/// A JoinHandle that completes when the loop has exited.
pub fn spawn_serve_task(
    listener: TcpListener,
    service: AdminService,
    shutdown: CancellationToken,
    state: watch::Sender<ServerState>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let signal = shutdown.clone();
        let result = axum::serve(listener, service.into_make_service())
            .with_graceful_shutdown(async move { signal.cancelled().await })
            .await;

        let outcome = match result {
            Ok(()) if shutdown.is_cancelled() => {
                info!("admin server stopped");
                ServerState::Stopped
            }
            Ok(()) => {
                error!("admin serve loop exited without a shutdown request");
                ServerState::Failed("serve loop exited unexpectedly".to_string())
            }
            Err(err) => {
                error!(error = %err, "admin serve loop failed");
                ServerState::Failed(err.to_string())
            }
        };
        state.send_replace(outcome);
    })
}
