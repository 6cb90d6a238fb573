//! Admin Server
//!
//! Composes the route table into one HTTP service and manages its lifecycle:
//! synchronous bind, background serve loop, bounded shutdown.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Request,
    http::Method,
    middleware,
    response::{IntoResponse, Response},
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower::{util::BoxCloneService, ServiceBuilder};
use tower_http::{
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::api::{self, not_found_handler, SharedControl};
use crate::config::AdminConfig;
use crate::dashboard;
use crate::debug::{self, DebugState, TraceRecorder};
use crate::error::{AdminError, Result};
use crate::middleware::{reflect_origin, AuthGate};
use crate::routing::{Access, RouteTable};
use crate::tasks::spawn_serve_task;

/// Port bound when the configured address is empty.
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// The fully composed admin HTTP service.
pub type AdminService = BoxCloneService<Request, Response, Infallible>;

// == Server State ==
/// Lifecycle of the serve loop as seen by supervisors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerState {
    /// Accepting connections
    Running,
    /// Exited after a requested shutdown
    Stopped,
    /// Exited on its own
    Failed(String),
}

// == Admin Server ==
/// Admin server under construction.
///
/// Routes can be added through [`AdminServer::routes_mut`] until the server is
/// started; `start` consumes the server, sealing the table.
pub struct AdminServer {
    config: AdminConfig,
    routes: RouteTable,
    control: SharedControl,
    trace_recorder: Option<TraceRecorder>,
}

impl AdminServer {
    pub fn new(config: AdminConfig, control: SharedControl) -> Self {
        Self {
            config,
            routes: RouteTable::new(),
            control,
            trace_recorder: None,
        }
    }

    /// Serves execution traces from `recorder` on `/debug/pprof/trace`.
    ///
    /// The recorder must also be installed as a layer of the global subscriber.
    pub fn with_trace_recorder(mut self, recorder: TraceRecorder) -> Self {
        self.trace_recorder = Some(recorder);
        self
    }

    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    /// Route table shared with subsystems that contribute endpoints.
    ///
    /// Built-in routes are registered at start and take precedence over
    /// routes registered here for the same (path, method).
    pub fn routes_mut(&mut self) -> &mut RouteTable {
        &mut self.routes
    }

    /// Every (path, method) the started server will answer, built-ins included.
    pub fn effective_routes(&self) -> Result<Vec<(String, Method, Access)>> {
        let mut routes = self.routes.clone();
        self.register_builtin_routes(&mut routes)?;
        Ok(routes.routes())
    }

    /// Health, profiling (when enabled), API and dashboard, in that order.
    fn register_builtin_routes(&self, routes: &mut RouteTable) -> Result<()> {
        api::register_health_route(routes)?;
        if self.config.pprof_enabled {
            let access = if self.config.debug_requires_auth {
                Access::Protected
            } else {
                Access::Public
            };
            let state = DebugState::new(self.config.write_timeout, self.trace_recorder.clone());
            debug::register_debug_routes(routes, access, state)?;
        }
        api::register_api_routes(routes, self.control.clone())?;
        dashboard::register_dashboard_routes(routes)?;
        Ok(())
    }

    /// Registers the built-in routes and composes the final service.
    ///
    /// The CORS wrapper sits outside routing, so preflight requests never reach
    /// the auth gate or a handler.
    pub fn into_service(mut self) -> Result<AdminService> {
        let mut routes = std::mem::take(&mut self.routes);
        self.register_builtin_routes(&mut routes)?;

        let config = &self.config;
        let gate = AuthGate::new(config.credentials.clone()).with_fail_delay(config.auth_fail_delay);
        let mut router = routes.into_router(Arc::new(gate)).fallback(not_found_handler);
        if !config.write_timeout.is_zero() {
            router = router.layer(TimeoutLayer::new(config.write_timeout));
        }
        if !config.read_timeout.is_zero() {
            router = router.layer(RequestBodyTimeoutLayer::new(config.read_timeout));
        }

        let service = ServiceBuilder::new()
            .map_response(IntoResponse::into_response)
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(reflect_origin))
            .service(router);

        Ok(BoxCloneService::new(service))
    }

    /// Binds the listener and starts serving in the background.
    ///
    /// Returns as soon as the listener is bound; a bind failure is the only
    /// error and leaves nothing listening. Must be called from within a Tokio
    /// runtime.
    pub fn start(self) -> Result<AdminHandle> {
        let address = resolve_bind_address(&self.config.address);
        let open_gate = self.config.credentials.is_empty();
        let service = self.into_service()?;

        let bind_err = |source| AdminError::Bind {
            address: address.clone(),
            source,
        };
        let listener = std::net::TcpListener::bind(address.as_str()).map_err(bind_err)?;
        listener.set_nonblocking(true).map_err(bind_err)?;
        let listener = tokio::net::TcpListener::from_std(listener).map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;

        let shutdown = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(ServerState::Running);
        let task = spawn_serve_task(listener, service, shutdown.clone(), state_tx);

        info!(address = %local_addr, "admin server listening");
        if open_gate {
            warn!("admin credentials are empty, API and dashboard accept any caller");
        }
        Ok(AdminHandle {
            local_addr,
            shutdown,
            state: state_rx,
            task,
        })
    }
}

// == Admin Handle ==
/// Handle to a running admin server.
///
/// Dropping the handle leaves the server running.
pub struct AdminHandle {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    state: watch::Receiver<ServerState>,
    task: JoinHandle<()>,
}

impl AdminHandle {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> ServerState {
        self.state.borrow().clone()
    }

    /// Receiver notified when the serve loop exits.
    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.state.clone()
    }

    /// Token that stops the serve loop when cancelled, without waiting.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Waits until the serve loop has exited and returns how it ended.
    pub async fn stopped(&self) -> ServerState {
        let mut state = self.state.clone();
        let outcome = match state.wait_for(|s| *s != ServerState::Running).await {
            Ok(current) => current.clone(),
            Err(_) => ServerState::Failed("serve task dropped its state channel".to_string()),
        };
        outcome
    }

    /// Stops accepting connections and waits for in-flight requests.
    ///
    /// Requests still running after `timeout` are aborted and
    /// [`AdminError::ShutdownTimeout`] is returned.
    pub async fn shutdown(mut self, timeout: Duration) -> Result<()> {
        self.shutdown.cancel();
        match tokio::time::timeout(timeout, &mut self.task).await {
            Ok(_) => Ok(()),
            Err(_) => {
                self.task.abort();
                warn!(?timeout, "admin server shutdown timed out, aborting in-flight requests");
                Err(AdminError::ShutdownTimeout(timeout))
            }
        }
    }
}

/// Resolves the configured address into something the OS can bind.
///
/// An empty address, or an empty host, binds all interfaces; an empty or
/// `http` port means the default HTTP port.
pub fn resolve_bind_address(address: &str) -> String {
    let Some((host, port)) = address.rsplit_once(':') else {
        if address.is_empty() {
            return format!("0.0.0.0:{DEFAULT_HTTP_PORT}");
        }
        return format!("{address}:{DEFAULT_HTTP_PORT}");
    };

    let host = if host.is_empty() { "0.0.0.0" } else { host };
    if port.is_empty() || port == "http" {
        format!("{host}:{DEFAULT_HTTP_PORT}")
    } else {
        format!("{host}:{port}")
    }
}
