//! Configuration Module
//!
//! Handles loading the admin server configuration from environment variables.

use std::env;
use std::fmt;
use std::time::Duration;

/// Read and write timeout applied to the admin HTTP server.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Delay before answering a request that failed authentication.
pub const DEFAULT_AUTH_FAIL_DELAY: Duration = Duration::from_millis(200);

/// Address used when none is configured through `ADMIN_ADDR`.
pub const DEFAULT_ADMIN_ADDRESS: &str = "127.0.0.1:7400";

// == Credentials ==
/// Static admin credentials, fixed for the lifetime of the process.
///
/// An empty user together with an empty password disables authentication.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// True when no credentials were configured at all.
    pub fn is_empty(&self) -> bool {
        self.user.is_empty() && self.password.is_empty()
    }

    pub fn matches(&self, user: &str, password: &str) -> bool {
        self.user == user && self.password == password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

// == Admin Config ==
/// Admin server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Bind address; empty means the default HTTP port on all interfaces
    pub address: String,
    /// Credentials guarding the API and dashboard routes
    pub credentials: Credentials,
    /// Registers the `/debug/pprof/` endpoints
    pub pprof_enabled: bool,
    /// Puts the profiling endpoints behind the auth gate
    pub debug_requires_auth: bool,
    /// Maximum time a request body may stall
    pub read_timeout: Duration,
    /// Maximum time spent handling one request
    pub write_timeout: Duration,
    /// Delay applied before rejecting bad credentials
    pub auth_fail_delay: Duration,
}

impl AdminConfig {
    /// Creates a new AdminConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `ADMIN_ADDR` - Bind address (default: 127.0.0.1:7400, empty for port 80)
    /// - `ADMIN_USER` - Admin user name (default: empty)
    /// - `ADMIN_PASSWORD` - Admin password (default: empty)
    /// - `ADMIN_PPROF_ENABLE` - Enable profiling endpoints (default: false)
    /// - `ADMIN_DEBUG_REQUIRES_AUTH` - Gate profiling endpoints (default: false)
    /// - `ADMIN_READ_TIMEOUT` - Read timeout in seconds (default: 60)
    /// - `ADMIN_WRITE_TIMEOUT` - Write timeout in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            address: env::var("ADMIN_ADDR").unwrap_or(defaults.address),
            credentials: Credentials::new(
                env::var("ADMIN_USER").unwrap_or_default(),
                env::var("ADMIN_PASSWORD").unwrap_or_default(),
            ),
            pprof_enabled: env::var("ADMIN_PPROF_ENABLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.pprof_enabled),
            debug_requires_auth: env::var("ADMIN_DEBUG_REQUIRES_AUTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.debug_requires_auth),
            read_timeout: env::var("ADMIN_READ_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.read_timeout),
            write_timeout: env::var("ADMIN_WRITE_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.write_timeout),
            auth_fail_delay: defaults.auth_fail_delay,
        }
    }

    /// Returns a copy bound to `address`.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Returns a copy guarded by `credentials`.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADMIN_ADDRESS.to_string(),
            credentials: Credentials::default(),
            pprof_enabled: false,
            debug_requires_auth: false,
            read_timeout: DEFAULT_HTTP_TIMEOUT,
            write_timeout: DEFAULT_HTTP_TIMEOUT,
            auth_fail_delay: DEFAULT_AUTH_FAIL_DELAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VARS: [&str; 7] = [
        "ADMIN_ADDR",
        "ADMIN_USER",
        "ADMIN_PASSWORD",
        "ADMIN_PPROF_ENABLE",
        "ADMIN_DEBUG_REQUIRES_AUTH",
        "ADMIN_READ_TIMEOUT",
        "ADMIN_WRITE_TIMEOUT",
    ];

    #[test]
    fn test_config_default() {
        let config = AdminConfig::default();
        assert_eq!(config.address, "127.0.0.1:7400");
        assert!(config.credentials.is_empty());
        assert!(!config.pprof_enabled);
        assert!(!config.debug_requires_auth);
        assert_eq!(config.read_timeout, Duration::from_secs(60));
        assert_eq!(config.write_timeout, Duration::from_secs(60));
        assert_eq!(config.auth_fail_delay, Duration::from_millis(200));
    }

    #[test]
    fn test_config_from_env_defaults() {
        temp_env::with_vars_unset(ALL_VARS, || {
            let config = AdminConfig::from_env();
            assert_eq!(config.address, "127.0.0.1:7400");
            assert!(config.credentials.is_empty());
            assert!(!config.pprof_enabled);
            assert_eq!(config.write_timeout, DEFAULT_HTTP_TIMEOUT);
        });
    }

    #[test]
    fn test_config_from_env_overrides() {
        temp_env::with_vars(
            [
                ("ADMIN_ADDR", Some("0.0.0.0:9100")),
                ("ADMIN_USER", Some("admin")),
                ("ADMIN_PASSWORD", Some("s3cret")),
                ("ADMIN_PPROF_ENABLE", Some("true")),
                ("ADMIN_DEBUG_REQUIRES_AUTH", Some("true")),
                ("ADMIN_READ_TIMEOUT", Some("5")),
                ("ADMIN_WRITE_TIMEOUT", Some("not-a-number")),
            ],
            || {
                let config = AdminConfig::from_env();
                assert_eq!(config.address, "0.0.0.0:9100");
                assert!(config.credentials.matches("admin", "s3cret"));
                assert!(config.pprof_enabled);
                assert!(config.debug_requires_auth);
                assert_eq!(config.read_timeout, Duration::from_secs(5));
                assert_eq!(config.write_timeout, DEFAULT_HTTP_TIMEOUT);
            },
        );
    }

    #[test]
    fn test_empty_address_is_kept() {
        temp_env::with_vars([("ADMIN_ADDR", Some(""))], || {
            assert_eq!(AdminConfig::from_env().address, "");
        });
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("admin", "hunter2");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("admin"));
        assert!(!printed.contains("hunter2"));
    }
}
