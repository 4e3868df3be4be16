//! Connection settings for the booking service.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for reaching the booking service.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the service (e.g., "https://tickets.example.com").
    /// Default: "http://localhost:8080"
    #[serde(default = "default_base_url")]
    base_url: String,
    /// Per-request timeout in seconds.
    /// Default: 10
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl ApiConfig {
    /// Creates a configuration for `base_url` with the default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Creates a configuration builder for more customization.
    #[must_use]
    pub fn builder(base_url: impl Into<String>) -> ApiConfigBuilder {
        ApiConfigBuilder::new(base_url)
    }

    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Builder for creating API configurations with custom settings.
#[derive(Debug)]
pub struct ApiConfigBuilder {
    config: ApiConfig,
}

impl ApiConfigBuilder {
    /// Creates a new builder with required fields.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            config: ApiConfig::new(base_url),
        }
    }

    /// Sets the per-request timeout in seconds.
    #[must_use]
    pub fn timeout_seconds(mut self, seconds: u64) -> Self {
        self.config.timeout_seconds = seconds;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ApiConfig {
        self.config
    }
}
