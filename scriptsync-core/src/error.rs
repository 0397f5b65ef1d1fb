//! Error types for scriptsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building or validating the run configuration.
///
/// Every variant is fatal for a run and is reported before any network call.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required value is absent or empty.
    #[error("missing required configuration value {key}; set it in .env or the environment")]
    Missing { key: &'static str },

    /// A required value still holds a template placeholder.
    #[error("{key} still holds a placeholder value; set a real value in .env")]
    Placeholder { key: &'static str },

    /// A value is present but cannot be interpreted.
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    /// `.env` exists but could not be parsed.
    #[error("failed to read {path}: {message}")]
    Dotenv { path: PathBuf, message: String },

    /// Underlying I/O failure while reading a configuration file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `scriptsync.yaml` is malformed: includes file path and serde_yaml context.
    #[error("failed to parse manifest at {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors from the credential store.
///
/// `NotFound` and `Corrupt` are handled identically by the authenticator
/// (both trigger a fresh consent), but stay distinct for diagnostics.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No credential file at the configured path.
    #[error("no stored credential at {path}")]
    NotFound { path: PathBuf },

    /// The file exists but is not a valid credential record.
    #[error("stored credential at {path} is unreadable: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Read, write or rename failure.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization failure on save.
    #[error("credential JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
