//! HTTP Basic authentication for the admin routes

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine;
use tracing::debug;

use crate::config::{Credentials, DEFAULT_AUTH_FAIL_DELAY};

const REALM_CHALLENGE: &str = r#"Basic realm="Restricted""#;

/// Static-credential gate shared by every protected route.
#[derive(Debug, Clone)]
pub struct AuthGate {
    credentials: Credentials,
    fail_delay: Duration,
}

impl AuthGate {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            fail_delay: DEFAULT_AUTH_FAIL_DELAY,
        }
    }

    /// Sets how long a rejected request waits before it is answered.
    pub fn with_fail_delay(mut self, fail_delay: Duration) -> Self {
        self.fail_delay = fail_delay;
        self
    }

    pub fn fail_delay(&self) -> Duration {
        self.fail_delay
    }

    /// True when no credentials are configured and every request passes.
    pub fn is_open(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Checks the request headers against the configured credentials.
    pub fn admits(&self, headers: &HeaderMap) -> bool {
        if self.is_open() {
            return true;
        }
        match basic_credentials(headers) {
            Some((user, password)) => self.credentials.matches(&user, &password),
            None => false,
        }
    }
}

/// Decodes `Authorization: Basic <base64(user:password)>`.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

/// Authentication middleware
///
/// Forwards the request untouched when the credentials match. Otherwise waits
/// for the gate's fail delay and answers `401 Unauthorized`.
pub async fn require_credentials(
    State(gate): State<Arc<AuthGate>>,
    request: Request,
    next: Next,
) -> Response {
    if gate.admits(request.headers()) {
        return next.run(request).await;
    }

    debug!(
        method = %request.method(),
        path = %request.uri().path(),
        "admin authentication failed"
    );
    tokio::time::sleep(gate.fail_delay).await;

    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, REALM_CHALLENGE)],
        "Unauthorized\n",
    )
        .into_response()
}
