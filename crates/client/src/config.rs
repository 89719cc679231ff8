//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GLT_API_BASE_URL` - Base URL of the Girlz Love Tech API (e.g., `https://api.girlzlovetech.org`)
//!
//! ## Optional
//! - `GLT_STATE_DIR` - Directory for persisted cart and tokens (default: `.glt`)
//! - `GLT_TOKEN_REFRESH_SECS` - Access token refresh interval (default: 240)
//! - `GLT_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_STATE_DIR: &str = ".glt";
const DEFAULT_TOKEN_REFRESH_SECS: u64 = 240;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL the endpoint paths are resolved against
    pub api_base_url: Url,
    /// Directory holding persisted client state
    pub state_dir: PathBuf,
    /// How often the session refreshes its access token
    pub token_refresh_interval: Duration,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production")
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
    /// Build a configuration with defaults for everything but the base URL.
    #[must_use]
    pub fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            token_refresh_interval: Duration::from_secs(DEFAULT_TOKEN_REFRESH_SECS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = lookup("GLT_API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("GLT_API_BASE_URL".to_string()))?;
        let api_base_url = Url::parse(raw_url.trim()).map_err(|e| {
            ConfigError::InvalidEnvVar("GLT_API_BASE_URL".to_string(), e.to_string())
        })?;
        if !matches!(api_base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "GLT_API_BASE_URL".to_string(),
                format!("unsupported scheme '{}'", api_base_url.scheme()),
            ));
        }

        let state_dir = lookup("GLT_STATE_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_STATE_DIR), PathBuf::from);
        let token_refresh_interval = parse_secs(
            &lookup,
            "GLT_TOKEN_REFRESH_SECS",
            DEFAULT_TOKEN_REFRESH_SECS,
        )?;
        let http_timeout = parse_secs(&lookup, "GLT_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;

        Ok(Self {
            api_base_url,
            state_dir,
            token_refresh_interval,
            http_timeout,
            sentry_dsn: lookup("SENTRY_DSN"),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a positive number of seconds, falling back to `default` when unset.
fn parse_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<Duration, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(Duration::from_secs(default));
    };
    let secs = raw
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            ClientConfig::from_lookup(lookup_from(&[("GLT_API_BASE_URL", "https://api.example.com")]))
                .unwrap();
        assert_eq!(config.api_base_url.as_str(), "https://api.example.com/");
        assert_eq!(config.state_dir, PathBuf::from(".glt"));
        assert_eq!(config.token_refresh_interval, Duration::from_secs(240));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("GLT_API_BASE_URL", "http://localhost:8000"),
            ("GLT_STATE_DIR", "/tmp/glt-state"),
            ("GLT_TOKEN_REFRESH_SECS", "60"),
            ("GLT_HTTP_TIMEOUT_SECS", "5"),
            ("SENTRY_DSN", "https://key@sentry.example.com/1"),
        ]))
        .unwrap();
        assert_eq!(config.state_dir, PathBuf::from("/tmp/glt-state"));
        assert_eq!(config.token_refresh_interval, Duration::from_secs(60));
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert!(config.sentry_dsn.is_some());
    }

    #[test]
    fn test_missing_base_url() {
        let err = ClientConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "GLT_API_BASE_URL"));
    }

    #[test]
    fn test_invalid_values() {
        let err = ClientConfig::from_lookup(lookup_from(&[("GLT_API_BASE_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(..)));

        let err = ClientConfig::from_lookup(lookup_from(&[("GLT_API_BASE_URL", "ftp://files.example.com")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(..)));

        let err = ClientConfig::from_lookup(lookup_from(&[
            ("GLT_API_BASE_URL", "https://api.example.com"),
            ("GLT_TOKEN_REFRESH_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "GLT_TOKEN_REFRESH_SECS"));
    }
}
