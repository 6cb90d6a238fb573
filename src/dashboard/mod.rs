//! Dashboard Module
//!
//! Serves the embedded dashboard assets under `/static/`, the favicon, and the
//! root redirect. All routes sit behind the auth gate.

use axum::{
    body::Body,
    extract::Request,
    handler::Handler,
    http::{header, Extensions, HeaderMap, Method, StatusCode, Uri, Version},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;
use tower_http::compression::CompressionLayer;

use crate::error::Result;
use crate::routing::{Access, RouteTable, ALL_METHODS};

/// Path prefix of the dashboard files.
pub const STATIC_PREFIX: &str = "/static/";

/// Embedded assets from assets/
#[derive(RustEmbed)]
#[folder = "assets/"]
pub struct DashboardAssets;

/// Registers the dashboard routes.
///
/// # Endpoints
/// - `GET /favicon.ico` - Favicon, uncompressed
/// - `GET /static/*path` - Dashboard files, gzip when accepted
/// - `/` - Permanent redirect to `/static/`
pub fn register_dashboard_routes(table: &mut RouteTable) -> Result<()> {
    let compressed = static_handler.layer(CompressionLayer::new().compress_when(worth_compressing));

    table
        .register("/favicon.ico", &[Method::GET], Access::Protected, favicon_handler)?
        .register("/static/", &[Method::GET], Access::Protected, compressed.clone())?
        .register("/static/*path", &[Method::GET], Access::Protected, compressed)?
        .register("/", ALL_METHODS, Access::Protected, redirect_handler)?;
    Ok(())
}

/// Compresses every successful response the client accepts gzip for.
fn worth_compressing(
    status: StatusCode,
    _version: Version,
    _headers: &HeaderMap,
    _extensions: &Extensions,
) -> bool {
    status.is_success()
}

async fn static_handler(request: Request) -> Response {
    let path = request
        .uri()
        .path()
        .strip_prefix(STATIC_PREFIX)
        .unwrap_or_default();
    serve_embedded::<DashboardAssets>(path, request.headers())
}

async fn favicon_handler(headers: HeaderMap) -> Response {
    serve_embedded::<DashboardAssets>("favicon.ico", &headers)
}

async fn redirect_handler(uri: Uri) -> Response {
    tracing::debug!(from = %uri, "redirecting to dashboard");
    (
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, STATIC_PREFIX)],
    )
        .into_response()
}

/// Serves one embedded file, honouring `If-None-Match`.
///
/// Directory paths (empty or ending in `/`) resolve to their `index.html`.
pub fn serve_embedded<E: RustEmbed>(path: &str, headers: &HeaderMap) -> Response {
    let path = path.trim_start_matches('/');
    if path.split('/').any(|segment| segment == "..") {
        return not_found();
    }

    let path = if path.is_empty() || path.ends_with('/') {
        format!("{path}index.html")
    } else {
        path.to_string()
    };

    let Some(file) = E::get(&path) else {
        return not_found();
    };

    let etag = format!("\"{}\"", hex_digest(&file.metadata.sha256_hash()));
    let fresh = headers
        .get(header::IF_NONE_MATCH)
        .is_some_and(|value| value.as_bytes() == etag.as_bytes());
    if fresh {
        return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response();
    }

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.as_ref().to_string()),
            (header::ETAG, etag),
        ],
        Body::from(file.data),
    )
        .into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 page not found\n").into_response()
}

fn hex_digest(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
