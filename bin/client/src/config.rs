//! Centralized client configuration.
//!
//! This module provides strongly-typed configuration for the client, loaded
//! via the `config` crate from `BOXOFFICE_`-prefixed environment variables.
//! Nested keys use `__`, e.g. `BOXOFFICE_API__BASE_URL`.
//!
//! See [`ApiConfig`] for the service connection settings.

use boxoffice_api::ApiConfig;
use boxoffice_session::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ClientError;

/// Prefix of the environment variables read by the client.
pub const ENV_PREFIX: &str = "BOXOFFICE";

/// Client configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    /// Booking service connection.
    #[serde(default)]
    pub api: ApiConfig,

    /// Where the token is kept between runs.
    /// Defaults to `boxoffice/token` under the platform config directory.
    #[serde(default)]
    pub credential_path: Option<PathBuf>,
}

impl ClientConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_source(None)
    }

    /// Loads configuration from the given variables instead of the process
    /// environment when `vars` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_source(vars: Option<HashMap<String, String>>) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(vars),
            )
            .build()?
            .try_deserialize()
    }

    /// Returns the file the token is persisted in.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if no path is configured and the
    /// platform has no config directory.
    pub fn credential_file(&self) -> Result<PathBuf, ClientError> {
        self.credential_path
            .clone()
            .or_else(FileCredentialStore::default_location)
            .ok_or_else(|| ClientError::Configuration {
                details: format!("set {ENV_PREFIX}_CREDENTIAL_PATH; no config directory found"),
            })
    }

    /// Builds the credential store. Ephemeral runs keep the token in memory
    /// only.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if no file location can be
    /// determined for a persistent store.
    pub fn credential_store(&self, ephemeral: bool) -> Result<Arc<dyn CredentialStore>, ClientError> {
        if ephemeral {
            return Ok(Arc::new(MemoryCredentialStore::new()));
        }
        Ok(Arc::new(FileCredentialStore::new(self.credential_file()?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = ClientConfig::from_source(vars(&[])).expect("config");
        assert_eq!(config.api.base_url(), "http://localhost:8080");
        assert!(config.credential_path.is_none());
    }

    #[test]
    fn reads_prefixed_nested_variables() {
        let config = ClientConfig::from_source(vars(&[
            ("BOXOFFICE_API__BASE_URL", "https://tickets.example.com"),
            ("BOXOFFICE_API__TIMEOUT_SECONDS", "3"),
            ("BOXOFFICE_CREDENTIAL_PATH", "/tmp/boxoffice-token"),
        ]))
        .expect("config");

        assert_eq!(config.api.base_url(), "https://tickets.example.com");
        assert_eq!(config.api.timeout(), std::time::Duration::from_secs(3));
        assert_eq!(
            config.credential_file().expect("path"),
            PathBuf::from("/tmp/boxoffice-token")
        );
    }

    #[test]
    fn unprefixed_variables_are_ignored() {
        let config =
            ClientConfig::from_source(vars(&[("API__BASE_URL", "http://elsewhere")])).expect("config");
        assert_eq!(config.api.base_url(), "http://localhost:8080");
    }

    #[test]
    fn invalid_timeout_is_an_error() {
        let result = ClientConfig::from_source(vars(&[("BOXOFFICE_API__TIMEOUT_SECONDS", "soon")]));
        assert!(result.is_err());
    }

    #[test]
    fn ephemeral_store_starts_empty() {
        let config = ClientConfig::from_source(vars(&[])).expect("config");
        let store = config.credential_store(true).expect("store");
        assert_eq!(store.read().expect("read"), None);
    }
}
