//! Portal configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! Every variable is optional; the DSO endpoint and client key default to the
//! built-in constants.
//!
//! - `PORTAL_HOST` - Bind address (default: 127.0.0.1)
//! - `PORTAL_PORT` - Listen port (default: 3000)
//! - `PORTAL_BASE_URL` - Public URL of the portal; `https` enables secure cookies
//!   (default: <http://localhost:3000>)
//! - `DSO_BASE_URL` - DSO backend base URL
//! - `DSO_CLIENT_KEY` - Client key sent with every DSO request
//! - `DSO_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `DSO_MOCK_MODE` - Serve sessions without calling the DSO (default: false)
//! - `DSO_FIELD_ALIASES` - Path to a JSON file overriding profile field aliases
//! - `SESSION_TTL_SECS` - Session lifetime (default: 1200, i.e. 20 minutes)
//! - `FETCH_THROTTLE_MS` - Minimum interval between repeated fetches (default: 2000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::normalize::FieldAliases;

/// DSO endpoint used when `DSO_BASE_URL` is unset.
pub const DEFAULT_DSO_BASE_URL: &str = "https://dso.example.org";

/// Client key the web application ships with.
pub const DEFAULT_DSO_CLIENT_KEY: &str = "portal-web-7Qk2vN9xLm4pR8sT";

/// Header the client key travels in.
pub const CLIENT_KEY_HEADER: &str = "x-client-key";

/// Default session lifetime: 20 minutes.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 20 * 60;

const MIN_CLIENT_KEY_LENGTH: usize = 16;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Portal application configuration.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the portal
    pub base_url: String,
    /// DSO backend configuration
    pub dso: DsoConfig,
    /// Session and fetch pacing
    pub session: SessionConfig,
    /// Profile field alias lists
    pub aliases: FieldAliases,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// DSO backend configuration.
///
/// Implements `Debug` manually to redact the client key.
#[derive(Clone)]
pub struct DsoConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    /// Client key sent in [`CLIENT_KEY_HEADER`]
    pub client_key: SecretString,
    /// Per-request timeout
    pub timeout: Duration,
    /// Serve sessions locally without calling the backend
    pub mock_mode: bool,
}

impl std::fmt::Debug for DsoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DsoConfig")
            .field("base_url", &self.base_url)
            .field("client_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("mock_mode", &self.mock_mode)
            .finish()
    }
}

impl DsoConfig {
    /// Configuration pointing at `base_url` with the default client key.
    ///
    /// Used by tests and tools that talk to a local DSO stand-in.
    #[must_use]
    pub fn for_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client_key: SecretString::from(DEFAULT_DSO_CLIENT_KEY),
            timeout: Duration::from_secs(30),
            mock_mode: false,
        }
    }
}

/// Session lifetime and fetch pacing.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// How long a saved session stays valid (also the token cookie max-age)
    pub ttl: Duration,
    /// Minimum interval between repeated fetches of the same resource
    pub throttle: Duration,
    /// Mark cookies `Secure`
    pub secure_cookies: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            throttle: Duration::from_millis(2000),
            secure_cookies: false,
        }
    }
}

impl PortalConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid, or if the
    /// alias override file cannot be read.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("PORTAL_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORTAL_HOST".to_string(), e.to_string()))?;
        let port = parse_env("PORTAL_PORT", 3000_u16)?;
        let base_url = get_url_env("PORTAL_BASE_URL", "http://localhost:3000")?;

        let dso = DsoConfig::from_env()?;

        let session = SessionConfig {
            ttl: Duration::from_secs(parse_env("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?),
            throttle: Duration::from_millis(parse_env("FETCH_THROTTLE_MS", 2000_u64)?),
            secure_cookies: base_url.starts_with("https://"),
        };

        let aliases = match get_optional_env("DSO_FIELD_ALIASES") {
            Some(path) => load_aliases(&PathBuf::from(path))?,
            None => FieldAliases::default(),
        };

        Ok(Self {
            host,
            port,
            base_url,
            dso,
            session,
            aliases,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Defaults around an explicit DSO configuration, without reading the
    /// environment.
    #[must_use]
    pub fn with_dso(dso: DsoConfig) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            dso,
            session: SessionConfig::default(),
            aliases: FieldAliases::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl DsoConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_url_env("DSO_BASE_URL", DEFAULT_DSO_BASE_URL)?;

        let client_key = SecretString::from(get_env_or_default(
            "DSO_CLIENT_KEY",
            DEFAULT_DSO_CLIENT_KEY,
        ));
        validate_client_key(&client_key, "DSO_CLIENT_KEY")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client_key,
            timeout: Duration::from_secs(parse_env("DSO_TIMEOUT_SECS", 30_u64)?),
            mock_mode: parse_env("DSO_MOCK_MODE", false)?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Get an environment variable that must be an absolute http(s) URL.
fn get_url_env(key: &str, default: &str) -> Result<String, ConfigError> {
    let raw = get_env_or_default(key, default);
    let url =
        Url::parse(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(raw)
}

/// Validate that the client key meets minimum length requirements.
fn validate_client_key(key: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = key.expose_secret();
    if value.len() < MIN_CLIENT_KEY_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_CLIENT_KEY_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Read a `FieldAliases` JSON override file.
fn load_aliases(path: &PathBuf) -> Result<FieldAliases, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::InvalidEnvVar("DSO_FIELD_ALIASES".to_string(), e.to_string())
    })?;
    serde_json::from_str(&raw)
        .map_err(|e| ConfigError::InvalidEnvVar("DSO_FIELD_ALIASES".to_string(), e.to_string()))
}
