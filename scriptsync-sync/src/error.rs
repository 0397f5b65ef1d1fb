//! Error types for scriptsync-sync.
//!
//! Fatal for a run: [`SyncError`] (configuration or authentication).
//! Recovered per artifact: [`ResolveError`], [`RemoteApiError`].

use std::path::PathBuf;

use thiserror::Error;

use scriptsync_core::ConfigError;

/// Transport-level failure of a single HTTP exchange (after retries).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpError {
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Connection, TLS, DNS or timeout failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl HttpError {
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure to obtain a usable credential. Always fatal for a run.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token endpoint rejected or failed a code/refresh exchange.
    #[error("{stage} exchange failed: {source}")]
    Exchange {
        stage: &'static str,
        #[source]
        source: HttpError,
    },

    /// The authorization URL could not be built from the configured endpoint.
    #[error("invalid authorization endpoint {endpoint}: {message}")]
    AuthorizationUrl { endpoint: String, message: String },

    /// Reading the authorization code from the operator failed.
    #[error("could not read authorization code: {0}")]
    Prompt(String),

    /// Consent is needed but this invocation may not prompt for it.
    #[error("no usable credential at {}{}; run `scriptsync update` first to authorize", path.display(), reason.as_deref().map(|r| format!(" ({r})")).unwrap_or_default())]
    ConsentRequired {
        path: PathBuf,
        reason: Option<String>,
    },
}

/// Non-success response from the remote project or spreadsheet APIs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{}{message}", status.map(|s| format!("HTTP {s}: ")).unwrap_or_default())]
pub struct RemoteApiError {
    /// Upstream HTTP status, `None` for transport failures.
    pub status: Option<u16>,
    pub message: String,
}

impl From<HttpError> for RemoteApiError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Status { status, message } => Self {
                status: Some(status),
                message,
            },
            other => Self {
                status: None,
                message: other.to_string(),
            },
        }
    }
}

/// Both source tiers failed for one artifact.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("failed to fetch {name} from local or remote source (local: {local}; remote: {remote})")]
    NotFound {
        name: String,
        local: String,
        remote: String,
    },
}

/// Run-aborting errors of the orchestrator.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
}

/// Why a single artifact was not written. Counted, never fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArtifactError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("remote update failed: {0}")]
    Remote(#[from] RemoteApiError),
}
