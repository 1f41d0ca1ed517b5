//! Client configuration

use crate::auth::token::DEFAULT_RENEWAL_WINDOW_SECS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the RideOps API client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the RideOps API, without a trailing slash
    pub base_url: String,
    /// Look-ahead window before token expiry that triggers silent renewal
    pub renewal_window_secs: i64,
    /// Request timeout applied to the underlying HTTP client
    pub request_timeout_secs: u64,
    /// Directory for persisted session state; `None` uses the default
    /// per-user location
    pub storage_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            renewal_window_secs: DEFAULT_RENEWAL_WINDOW_SECS,
            request_timeout_secs: 30,
            storage_dir: None,
        }
    }
}

impl ClientConfig {
    /// Create a config pointing at the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the renewal look-ahead window in seconds
    pub fn with_renewal_window(mut self, secs: i64) -> Self {
        self.renewal_window_secs = secs;
        self
    }

    /// Set the request timeout in seconds
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Set the session storage directory
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Apply environment overrides: `RIDEOPS_BASE_URL`,
    /// `RIDEOPS_TIMEOUT_SECS`, `RIDEOPS_STORAGE_DIR`
    pub fn from_env(mut self) -> Self {
        if let Ok(url) = std::env::var("RIDEOPS_BASE_URL") {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
        if let Ok(raw) = std::env::var("RIDEOPS_TIMEOUT_SECS") {
            if let Ok(secs) = raw.parse() {
                self.request_timeout_secs = secs;
            }
        }
        if let Ok(dir) = std::env::var("RIDEOPS_STORAGE_DIR") {
            if !dir.trim().is_empty() {
                self.storage_dir = Some(PathBuf::from(dir));
            }
        }
        self
    }

    /// Resolved URL for an endpoint path
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.renewal_window_secs, 600);
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.storage_dir.is_none());
    }

    #[test]
    fn builder_methods() {
        let config = ClientConfig::new("https://api.rideops.example")
            .with_renewal_window(120)
            .with_timeout(10)
            .with_storage_dir("/tmp/rideops");

        assert_eq!(config.base_url, "https://api.rideops.example");
        assert_eq!(config.renewal_window_secs, 120);
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.storage_dir, Some(PathBuf::from("/tmp/rideops")));
    }

    #[test]
    fn endpoint_url_strips_trailing_slash() {
        let config = ClientConfig::new("https://api.rideops.example/");
        assert_eq!(
            config.endpoint_url("/rides"),
            "https://api.rideops.example/rides"
        );
    }
}
