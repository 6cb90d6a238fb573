//! Debug Module
//!
//! Runtime diagnostics under `/debug/pprof/`:
//! - `cmdline` - Process command line, NUL separated
//! - `profile` - CPU profile in pprof protobuf format
//! - `symbol` - Address to symbol resolution
//! - `trace` - Execution trace of the tracing events in a time window
//! - index page and the `runtime` named profile
//!
//! Registered only when profiling is enabled. The routes are public unless the
//! configuration asks for them to be gated.

mod profile;
mod trace;

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, Method, Uri},
    response::{Html, IntoResponse, Response},
};
use tracing::info;

use crate::error::{AdminError, Result};
use crate::models::CaptureQuery;
use crate::routing::{Access, RouteTable, ALL_METHODS};

pub use profile::{resolve_symbols, CpuProfiler};
pub use trace::TraceRecorder;

/// Path prefix of the profiling endpoints.
pub const DEBUG_PREFIX: &str = "/debug/pprof/";

const DEFAULT_PROFILE_SECONDS: u64 = 30;
const DEFAULT_TRACE_SECONDS: u64 = 1;

/// Profiles listed on the index page: (name, description).
const PROFILES: &[(&str, &str)] = &[
    ("cmdline", "The command line invocation of the current program"),
    (
        "profile",
        "CPU profile. Use the seconds GET parameter to set the duration",
    ),
    ("runtime", "Tokio runtime workers, alive tasks and queue depth"),
    ("symbol", "Resolves program counters given in the request to symbol names"),
    (
        "trace",
        "Tracing events of the current program. Use the seconds GET parameter to set the duration",
    ),
];

/// Shared state of the profiling handlers.
#[derive(Clone)]
pub struct DebugState {
    write_timeout: Duration,
    profiler: CpuProfiler,
    recorder: Option<TraceRecorder>,
}

impl DebugState {
    pub fn new(write_timeout: Duration, recorder: Option<TraceRecorder>) -> Self {
        Self {
            write_timeout,
            profiler: CpuProfiler::new(),
            recorder,
        }
    }

    /// Rejects captures that would outlive the server's write timeout.
    fn check_window(&self, seconds: u64) -> Result<Duration> {
        let window = Duration::from_secs(seconds);
        if !self.write_timeout.is_zero() && window >= self.write_timeout {
            return Err(AdminError::InvalidRequest(
                "profile duration exceeds server's WriteTimeout".to_string(),
            ));
        }
        Ok(window)
    }
}

/// Registers the profiling endpoints on the top-level table.
pub fn register_debug_routes(
    table: &mut RouteTable,
    access: Access,
    state: DebugState,
) -> Result<()> {
    table
        .register("/debug/pprof/cmdline", ALL_METHODS, access, cmdline_handler)?
        .register_with_state(
            "/debug/pprof/profile",
            ALL_METHODS,
            access,
            profile_handler,
            state.clone(),
        )?
        .register("/debug/pprof/symbol", ALL_METHODS, access, symbol_handler)?
        .register_with_state(
            "/debug/pprof/trace",
            ALL_METHODS,
            access,
            trace_handler,
            state,
        )?
        .register(DEBUG_PREFIX, ALL_METHODS, access, index_handler)?
        .register("/debug/pprof/*name", ALL_METHODS, access, named_profile_handler)?;
    Ok(())
}

async fn cmdline_handler() -> Response {
    let args: Vec<String> = std::env::args().collect();
    text_response(args.join("\0"))
}

async fn profile_handler(
    State(state): State<DebugState>,
    Query(query): Query<CaptureQuery>,
) -> Result<Response> {
    let window = state.check_window(query.seconds_or(DEFAULT_PROFILE_SECONDS))?;
    info!(seconds = window.as_secs(), "capturing cpu profile");

    let profile = state.profiler.capture(window).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream"),
            (header::CONTENT_DISPOSITION, r#"attachment; filename="profile""#),
        ],
        profile,
    )
        .into_response())
}

async fn symbol_handler(method: Method, uri: Uri, body: Bytes) -> Response {
    let input = if method == Method::POST {
        String::from_utf8_lossy(&body).into_owned()
    } else {
        uri.query().unwrap_or_default().to_string()
    };
    text_response(resolve_symbols(&input))
}

async fn trace_handler(
    State(state): State<DebugState>,
    Query(query): Query<CaptureQuery>,
) -> Result<Response> {
    let window = state.check_window(query.seconds_or(DEFAULT_TRACE_SECONDS))?;
    let recorder = state.recorder.as_ref().ok_or_else(|| {
        AdminError::Unsupported("execution tracing is not enabled".to_string())
    })?;
    info!(seconds = window.as_secs(), "capturing execution trace");

    let events = recorder.capture(window).await?;
    let mut body = events.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    Ok(text_response(body))
}

async fn index_handler() -> Html<String> {
    let rows: String = PROFILES
        .iter()
        .map(|(name, description)| {
            format!("<tr><td><a href=\"{name}?debug=1\">{name}</a></td><td>{description}</td></tr>\n")
        })
        .collect();

    Html(format!(
        "<html>\n<head><title>/debug/pprof/</title></head>\n<body>\n\
         /debug/pprof/<br>\n<br>\n<table>\n{rows}</table>\n</body>\n</html>\n"
    ))
}

async fn named_profile_handler(Path(name): Path<String>) -> Result<Response> {
    match name.trim_start_matches('/') {
        "" => Ok(index_handler().await.into_response()),
        "runtime" => Ok(text_response(runtime_profile())),
        _ => Err(AdminError::NotFound("Unknown profile".to_string())),
    }
}

fn runtime_profile() -> String {
    let metrics = tokio::runtime::Handle::current().metrics();
    format!(
        "workers: {}\nalive_tasks: {}\nglobal_queue_depth: {}\n",
        metrics.num_workers(),
        metrics.num_alive_tasks(),
        metrics.global_queue_depth()
    )
}

fn text_response(body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_window_must_fit_write_timeout() {
        let state = DebugState::new(Duration::from_secs(60), None);
        assert_eq!(state.check_window(30).unwrap(), Duration::from_secs(30));
        assert!(matches!(
            state.check_window(60),
            Err(AdminError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_zero_write_timeout_disables_check() {
        let state = DebugState::new(Duration::ZERO, None);
        assert!(state.check_window(3600).is_ok());
    }

    #[test]
    fn test_registers_every_endpoint_with_requested_access() {
        let mut table = RouteTable::new();
        register_debug_routes(
            &mut table,
            Access::Protected,
            DebugState::new(Duration::from_secs(60), None),
        )
        .unwrap();

        for path in [
            "/debug/pprof/cmdline",
            "/debug/pprof/profile",
            "/debug/pprof/symbol",
            "/debug/pprof/trace",
            "/debug/pprof/",
            "/debug/pprof/*name",
        ] {
            assert_eq!(
                table.access_of(path, &Method::GET),
                Some(Access::Protected),
                "{path}"
            );
        }
    }

    #[tokio::test]
    async fn test_index_lists_profiles() {
        let Html(page) = index_handler().await;
        for (name, _) in PROFILES {
            assert!(page.contains(&format!("href=\"{name}?debug=1\"")));
        }
    }

    #[tokio::test]
    async fn test_unknown_named_profile() {
        let result = named_profile_handler(Path("goroutine".to_string())).await;
        assert!(matches!(result, Err(AdminError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_runtime_profile() {
        let response = named_profile_handler(Path("runtime".to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
