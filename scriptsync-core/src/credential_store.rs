//! Durable single-record credential store.
//!
//! # Storage
//!
//! One JSON document (default `<project_dir>/token.json`, mode `0600` on Unix).
//!
//! Write flow: serialize → `.json.tmp` sibling → `chmod 0600` → `rename`.
//! The `.tmp` is always in the same directory as the target, so the rename
//! never crosses filesystems. A failed `chmod` is logged and the save still
//! succeeds; the credential stays usable either way.
//!
//! There is no locking: two processes sharing one file can race on
//! refresh-and-save, last rename wins.

use std::path::{Path, PathBuf};

use crate::error::{io_err, StoreError};
use crate::types::Credential;

/// Holds the path of the credential file; all I/O happens per call.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the stored credential.
    ///
    /// Returns `StoreError::NotFound` if absent and `StoreError::Corrupt`
    /// (with the serde_json context) if the content is not a credential.
    pub fn load(&self) -> Result<Credential, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::NotFound {
                path: self.path.clone(),
            });
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|e| io_err(&self.path, e))?;
        serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Atomically persist `credential` with owner-only permissions.
    pub fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }

        let json = serde_json::to_string_pretty(credential)?;
        let tmp = self.tmp_path();
        std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
        if let Err(err) = restrict_to_owner(&tmp) {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "could not restrict credential file to owner-only access"
            );
        }
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&self.path, e));
        }
        tracing::debug!(path = %self.path.display(), "credential saved");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "token.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// `chmod 0600` on Unix; no-op elsewhere.
pub fn restrict_to_owner(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
