//! Remote service configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where and how to reach the remote habit service.
///
/// Deserializable so it can be embedded as a table in a TOML config file;
/// every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the service (default: https://localhost:7038).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Path of the session refresh endpoint (default: /account/refresh).
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
}

// Default value functions
fn default_base_url() -> String {
    "https://localhost:7038".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_refresh_path() -> String {
    "/account/refresh".to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            refresh_path: default_refresh_path(),
        }
    }
}

impl SyncConfig {
    /// Configuration for the service at `base_url`, other fields defaulted.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Set the session refresh path.
    pub fn with_refresh_path(mut self, path: &str) -> Self {
        self.refresh_path = path.to_string();
        self
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.base_url, "https://localhost:7038");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.refresh_path, "/account/refresh");
    }

    #[test]
    fn builder_pattern() {
        let config = SyncConfig::new("http://example.test/")
            .with_timeout(Duration::from_secs(5))
            .with_refresh_path("/auth/refresh");

        assert_eq!(config.base_url, "http://example.test");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.refresh_path, "/auth/refresh");
    }

    #[test]
    fn sub_second_timeout_rounds_up() {
        let config = SyncConfig::default().with_timeout(Duration::from_millis(200));
        assert_eq!(config.timeout_secs, 1);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: SyncConfig = serde_json::from_str(r#"{"base_url":"http://x"}"#).unwrap();
        assert_eq!(config.base_url, "http://x");
        assert_eq!(config.timeout_secs, 30);
    }
}
