//! Persisted credential file.
//!
//! One JSON file holds the process's single [`TokenSet`]. Writes go
//! through a temp file and an atomic rename so a concurrent `load` never
//! observes a partially written record; the process is the sole writer, so
//! no cross-process locking is needed. The documented reset path is
//! deleting the file by hand.

use std::path::{Path, PathBuf};

use tracing::instrument;

use super::AuthError;
use super::token::TokenSet;

/// File permissions for the token file (Unix only): owner read/write.
#[cfg(unix)]
const FILE_MODE: u32 = 0o600;

/// Directory permissions (Unix only): owner read/write/execute.
#[cfg(unix)]
const DIR_MODE: u32 = 0o700;

/// File-backed store for the credential record.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Create a store at the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file path of the persisted record.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted record, or `None` if no file exists.
    ///
    /// Any failure other than the file being absent propagates.
    #[instrument(skip(self))]
    pub fn load(&self) -> Result<Option<TokenSet>, AuthError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AuthError::Storage(format!(
                    "Failed to read token file '{}': {}",
                    self.path.display(),
                    e
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let token: TokenSet = serde_json::from_str(&content).map_err(|e| {
            AuthError::Storage(format!(
                "Failed to parse token file '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(Some(token))
    }

    /// Persist the record, overwriting any previous one.
    #[instrument(skip(self, token))]
    pub fn save(&self, token: &TokenSet) -> Result<(), AuthError> {
        self.ensure_parent_dir()?;

        let content = serde_json::to_string_pretty(token)
            .map_err(|e| AuthError::Storage(format!("Failed to serialize token: {}", e)))?;

        // Write to a temp file first, then rename for atomicity. On Unix,
        // set 0600 permissions at creation time to avoid a window where
        // the tokens are readable by other users.
        let temp_path = self.path.with_extension("tmp");

        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(FILE_MODE)
                .open(&temp_path)
                .map_err(|e| {
                    AuthError::Storage(format!(
                        "Failed to create temp file '{}': {}",
                        temp_path.display(),
                        e
                    ))
                })?;
            file.write_all(content.as_bytes()).map_err(|e| {
                AuthError::Storage(format!(
                    "Failed to write temp file '{}': {}",
                    temp_path.display(),
                    e
                ))
            })?;
            file.sync_all().map_err(|e| {
                AuthError::Storage(format!(
                    "Failed to sync temp file '{}': {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        #[cfg(not(unix))]
        {
            std::fs::write(&temp_path, &content).map_err(|e| {
                AuthError::Storage(format!(
                    "Failed to write temp file '{}': {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if let Err(e) = std::fs::rename(&temp_path, &self.path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(AuthError::Storage(format!(
                "Failed to rename '{}' to '{}': {}",
                temp_path.display(),
                self.path.display(),
                e
            )));
        }

        Ok(())
    }

    fn ensure_parent_dir(&self) -> Result<(), AuthError> {
        let Some(parent) = self.path.parent() else {
            return Ok(());
        };
        if parent.as_os_str().is_empty() || parent.exists() {
            return Ok(());
        }

        std::fs::create_dir_all(parent).map_err(|e| {
            AuthError::Storage(format!(
                "Failed to create token directory '{}': {}",
                parent.display(),
                e
            ))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(DIR_MODE);
            std::fs::set_permissions(parent, perms).map_err(|e| {
                AuthError::Storage(format!(
                    "Failed to set directory permissions on '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        Ok(())
    }
}
