//! Immutable run configuration.
//!
//! Built exactly once at startup from a key lookup (process environment layered
//! over `<project_dir>/.env`) and then passed by reference into every component.
//! Nothing below this module reads the environment.
//!
//! # Keys
//!
//! ```text
//! GOOGLE_CLIENT_ID, GOOGLE_CLIENT_SECRET     delegated-app identity   (required)
//! GOOGLE_REDIRECT_URI                        consent redirect target  (default http://localhost:3000/oauth2callback)
//! GOOGLE_SCRIPT_ID                           target project           (required)
//! GITHUB_REPO_URL, GITHUB_BRANCH             remote content source    (optional, branch defaults to main)
//! SCRIPTSYNC_SOURCE_DIR                      local content source     (default: project dir)
//! SCRIPTSYNC_TOKEN_PATH                      credential file          (default: <project dir>/token.json)
//! SCRIPTSYNC_AUTH_CODE                       non-interactive consent code
//! SCRIPTSYNC_HTTP_TIMEOUT_SECS               per-request timeout      (default 30)
//! SCRIPTSYNC_{SCRIPT_API,SHEETS_API,TOKEN,AUTH}_URL   endpoint overrides
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub mod keys {
    pub const CLIENT_ID: &str = "GOOGLE_CLIENT_ID";
    pub const CLIENT_SECRET: &str = "GOOGLE_CLIENT_SECRET";
    pub const REDIRECT_URI: &str = "GOOGLE_REDIRECT_URI";
    pub const SCRIPT_ID: &str = "GOOGLE_SCRIPT_ID";
    pub const REPO_URL: &str = "GITHUB_REPO_URL";
    pub const BRANCH: &str = "GITHUB_BRANCH";
    pub const SOURCE_DIR: &str = "SCRIPTSYNC_SOURCE_DIR";
    pub const TOKEN_PATH: &str = "SCRIPTSYNC_TOKEN_PATH";
    pub const AUTH_CODE: &str = "SCRIPTSYNC_AUTH_CODE";
    pub const HTTP_TIMEOUT_SECS: &str = "SCRIPTSYNC_HTTP_TIMEOUT_SECS";
    pub const SCRIPT_API_URL: &str = "SCRIPTSYNC_SCRIPT_API_URL";
    pub const SHEETS_API_URL: &str = "SCRIPTSYNC_SHEETS_API_URL";
    pub const TOKEN_URL: &str = "SCRIPTSYNC_TOKEN_URL";
    pub const AUTH_URL: &str = "SCRIPTSYNC_AUTH_URL";
}

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/oauth2callback";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
pub const TOKEN_FILE: &str = "token.json";
pub const ENV_FILE: &str = ".env";

/// Remote endpoints. Overridable so tests can point at a local mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub script_api: String,
    pub sheets_api: String,
    pub token: String,
    pub auth: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            script_api: "https://script.googleapis.com".to_string(),
            sheets_api: "https://sheets.googleapis.com".to_string(),
            token: "https://oauth2.googleapis.com/token".to_string(),
            auth: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
        }
    }
}

/// Run configuration. Construct with [`Config::load`] or [`Config::from_lookup`].
#[derive(Clone)]
pub struct Config {
    pub project_dir: PathBuf,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub script_id: String,
    pub repo_url: Option<String>,
    pub branch: String,
    pub source_dir: PathBuf,
    pub token_path: PathBuf,
    pub auth_code: Option<String>,
    pub http_timeout: Duration,
    pub endpoints: Endpoints,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("project_dir", &self.project_dir)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("script_id", &self.script_id)
            .field("repo_url", &self.repo_url)
            .field("branch", &self.branch)
            .field("source_dir", &self.source_dir)
            .field("token_path", &self.token_path)
            .field("auth_code", &self.auth_code.as_ref().map(|_| "<redacted>"))
            .field("http_timeout", &self.http_timeout)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

impl Config {
    /// Load from the process environment layered over `<project_dir>/.env`.
    ///
    /// Variables already set in the environment win over `.env`, and the
    /// process environment is never modified.
    pub fn load(project_dir: &Path) -> Result<Self, ConfigError> {
        let mut vars = read_env_file(&project_dir.join(ENV_FILE))?;
        vars.extend(std::env::vars());
        Self::from_lookup(project_dir, |key| vars.get(key).cloned())
    }

    /// Build from an arbitrary key lookup. Only parse errors are reported here;
    /// required-value checks live in [`validate`](Self::validate).
    pub fn from_lookup(
        project_dir: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let http_timeout = match get(keys::HTTP_TIMEOUT_SECS) {
            None => DEFAULT_HTTP_TIMEOUT,
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: keys::HTTP_TIMEOUT_SECS,
                        value: raw,
                    })
                }
            },
        };

        let defaults = Endpoints::default();
        let endpoints = Endpoints {
            script_api: get(keys::SCRIPT_API_URL).unwrap_or(defaults.script_api),
            sheets_api: get(keys::SHEETS_API_URL).unwrap_or(defaults.sheets_api),
            token: get(keys::TOKEN_URL).unwrap_or(defaults.token),
            auth: get(keys::AUTH_URL).unwrap_or(defaults.auth),
        };

        Ok(Self {
            project_dir: project_dir.to_path_buf(),
            client_id: get(keys::CLIENT_ID).unwrap_or_default(),
            client_secret: get(keys::CLIENT_SECRET).unwrap_or_default(),
            redirect_uri: get(keys::REDIRECT_URI)
                .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            script_id: get(keys::SCRIPT_ID).unwrap_or_default(),
            repo_url: get(keys::REPO_URL).map(|u| u.trim_end_matches('/').to_string()),
            branch: get(keys::BRANCH).unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            source_dir: get(keys::SOURCE_DIR)
                .map(|p| resolve_path(project_dir, &p))
                .unwrap_or_else(|| project_dir.to_path_buf()),
            token_path: get(keys::TOKEN_PATH)
                .map(|p| resolve_path(project_dir, &p))
                .unwrap_or_else(|| project_dir.join(TOKEN_FILE)),
            auth_code: get(keys::AUTH_CODE),
            http_timeout,
            endpoints,
        })
    }

    /// Check every value the sync engine needs before touching the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_client()?;
        require(keys::SCRIPT_ID, &self.script_id)
    }

    /// Check only the delegated-app identity (enough for token refresh).
    pub fn validate_client(&self) -> Result<(), ConfigError> {
        require(keys::CLIENT_ID, &self.client_id)?;
        require(keys::CLIENT_SECRET, &self.client_secret)?;
        require(keys::REDIRECT_URI, &self.redirect_uri)
    }

    /// Base URL of the remote content source, if configured with a real value.
    pub fn remote_source(&self) -> Option<&str> {
        self.repo_url.as_deref().filter(|url| !is_placeholder(url))
    }

    /// `https://script.google.com/d/<id>/edit`
    pub fn project_edit_url(&self) -> String {
        format!("https://script.google.com/d/{}/edit", self.script_id)
    }
}

/// `true` for empty values and the template values shipped in `.env` examples
/// (`your_client_id_here`, `https://github.com/your-username/...`, `<script id>`).
pub fn is_placeholder(value: &str) -> bool {
    let v = value.trim();
    if v.is_empty() {
        return true;
    }
    let lower = v.to_ascii_lowercase();
    (lower.starts_with("your_") && lower.ends_with("_here"))
        || lower.contains("your-username")
        || (v.starts_with('<') && v.ends_with('>'))
}

fn require(key: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing { key });
    }
    if is_placeholder(value) {
        return Err(ConfigError::Placeholder { key });
    }
    Ok(())
}

/// Expand `~/` and resolve relative paths against the project directory.
fn resolve_path(project_dir: &Path, raw: &str) -> PathBuf {
    let expanded = match raw.strip_prefix("~/") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(raw),
        },
        None => PathBuf::from(raw),
    };
    if expanded.is_absolute() {
        expanded
    } else {
        project_dir.join(expanded)
    }
}

/// Parse `.env` into a map. A missing file yields an empty map.
fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let iter = dotenvy::from_path_iter(path).map_err(|e| ConfigError::Dotenv {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut vars = HashMap::new();
    for item in iter {
        let (key, value) = item.map_err(|e| ConfigError::Dotenv {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        vars.insert(key, value);
    }
    Ok(vars)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
