//! Client configuration read from the environment.

use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

/// Environment variable holding the service base URL.
pub const API_URL_VAR: &str = "TALEFORGE_API_URL";
/// Environment variable holding the request timeout in seconds.
pub const HTTP_TIMEOUT_VAR: &str = "TALEFORGE_HTTP_TIMEOUT_SECS";

/// Base URL used when `TALEFORGE_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
/// Request timeout used when `TALEFORGE_HTTP_TIMEOUT_SECS` is unset.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The base URL does not parse or is not http(s).
    #[error("{API_URL_VAR} must be an http(s) URL, got {value:?}: {reason}")]
    InvalidUrl {
        /// The offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The timeout is not a positive integer.
    #[error("{HTTP_TIMEOUT_VAR} must be a positive number of seconds, got {0:?}")]
    InvalidTimeout(String),
}

/// Settings for `HttpStoryService`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the API, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_owned(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Builds a configuration for `base_url` with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if `base_url` is not an http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            timeout: DEFAULT_HTTP_TIMEOUT,
        })
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = match lookup(API_URL_VAR) {
            Some(value) => normalize_base_url(&value)?,
            None => DEFAULT_API_URL.to_owned(),
        };

        let timeout = match lookup(HTTP_TIMEOUT_VAR) {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidTimeout(value))?,
            None => DEFAULT_HTTP_TIMEOUT,
        };

        Ok(Self { base_url, timeout })
    }
}

fn normalize_base_url(value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).map_err(|e| ConfigError::InvalidUrl {
        value: value.to_owned(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            value: value.to_owned(),
            reason: format!("unsupported scheme {}", url.scheme()),
        });
    }
    Ok(trimmed.to_owned())
}
