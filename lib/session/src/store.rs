//! Persisted credential slot.
//!
//! The store holds at most one token and performs no validation. It survives
//! process restarts until it is cleared or overwritten.

use rootcause::Report;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

use crate::error::StoreError;

/// Name of the token file inside the application's config directory.
const TOKEN_FILE_NAME: &str = "token";
/// Application directory under the platform config directory.
const APP_DIR_NAME: &str = "boxoffice";

/// A single persisted string slot holding the latest token.
pub trait CredentialStore: Send + Sync {
    /// Returns the stored token, or `None` if the slot is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot exists but cannot be read.
    fn read(&self) -> Result<Option<String>, Report<StoreError>>;

    /// Replaces the stored token.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be written.
    fn save(&self, token: &str) -> Result<(), Report<StoreError>>;

    /// Empties the slot. Clearing an empty slot succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot exists but cannot be removed.
    fn clear(&self) -> Result<(), Report<StoreError>>;
}

/// Stores the token in a single file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Creates a store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the default token location under the user's config directory,
    /// or `None` if the platform has no config directory.
    #[must_use]
    pub fn default_location() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(TOKEN_FILE_NAME))
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn write_file(&self, token: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let staging = self.path.with_extension("tmp");
        std::fs::write(&staging, token)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&staging, std::fs::Permissions::from_mode(0o600))?;
        }
        std::fs::rename(&staging, &self.path)
    }
}

impl CredentialStore for FileCredentialStore {
    fn read(&self) -> Result<Option<String>, Report<StoreError>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::ReadFailed {
                location: self.location(),
                reason: e.to_string(),
            }
            .into()),
        }
    }

    fn save(&self, token: &str) -> Result<(), Report<StoreError>> {
        self.write_file(token).map_err(|e| StoreError::WriteFailed {
            location: self.location(),
            reason: e.to_string(),
        })?;
        debug!(path = %self.path.display(), "credential saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), Report<StoreError>> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "credential cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::ClearFailed {
                location: self.location(),
                reason: e.to_string(),
            }
            .into()),
        }
    }
}

/// Keeps the token in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `token`.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(token.into())),
        }
    }

    /// Returns the current token without going through the trait.
    #[must_use]
    pub fn peek(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn read(&self) -> Result<Option<String>, Report<StoreError>> {
        Ok(self.peek())
    }

    fn save(&self, token: &str) -> Result<(), Report<StoreError>> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), Report<StoreError>> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}
