//! Domain types shared by the sync engine and the reporting tools.
//!
//! All types are serializable via serde; the credential record uses the
//! camel-case JSON layout of the token file and still reads the snake-case
//! layout written by older tooling.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// A credential expiring within this many seconds already counts as stale.
pub const EXPIRY_SKEW_SECS: i64 = 60;

/// A delegated access credential: access/refresh token pair plus expiry.
///
/// `expiry == None` means "assume valid until a call fails authentication".
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(alias = "access_token")]
    pub access_token: String,
    #[serde(default, alias = "refresh_token")]
    pub refresh_token: String,
    /// Epoch milliseconds on disk.
    #[serde(
        default,
        alias = "expiry_date",
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, alias = "token_type", skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl Credential {
    /// `true` when the expiry is absent or more than [`EXPIRY_SKEW_SECS`]
    /// after `now`.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            None => true,
            Some(expiry) => expiry
                .checked_sub_signed(Duration::seconds(EXPIRY_SKEW_SECS))
                .map_or(false, |deadline| deadline > now),
        }
    }

    /// [`is_fresh_at`](Self::is_fresh_at) against the current wall clock.
    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now())
    }

    /// Whether a refresh exchange can be attempted at all.
    pub fn can_refresh(&self) -> bool {
        !self.refresh_token.trim().is_empty()
    }
}

// Tokens never reach logs or panic messages.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &if self.can_refresh() { "<redacted>" } else { "<none>" },
            )
            .field("expiry", &self.expiry)
            .field("scope", &self.scope)
            .field("token_type", &self.token_type)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// Remote file type of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactKind {
    /// Server-side script logic (`.gs`).
    #[default]
    ServerJs,
    /// Markup served by the project (`.html`).
    Html,
    /// The project manifest (`appsscript.json`).
    Json,
}

impl ArtifactKind {
    /// Type string used by the remote project content API.
    pub fn as_remote_type(self) -> &'static str {
        match self {
            ArtifactKind::ServerJs => "SERVER_JS",
            ArtifactKind::Html => "HTML",
            ArtifactKind::Json => "JSON",
        }
    }

    /// Infer the kind from a file name's extension. Unknown extensions are
    /// treated as server logic.
    pub fn from_file_name(name: &str) -> Self {
        match name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
            Some(ext) if ext == "html" || ext == "htm" => ArtifactKind::Html,
            Some(ext) if ext == "json" => ArtifactKind::Json,
            _ => ArtifactKind::ServerJs,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_remote_type())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "server_js" | "server-js" | "gs" | "script" => Ok(ArtifactKind::ServerJs),
            "html" => Ok(ArtifactKind::Html),
            "json" => Ok(ArtifactKind::Json),
            other => Err(format!(
                "unknown artifact kind '{other}'; expected: server_js, html, json"
            )),
        }
    }
}

/// A named desired file in the remote project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSpec {
    /// File name including extension, e.g. `Config.gs`. Stable across runs.
    pub name: String,
    pub kind: ArtifactKind,
}

impl ArtifactSpec {
    /// Build a spec whose kind is inferred from the file extension.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = ArtifactKind::from_file_name(&name);
        Self { name, kind }
    }

    pub fn with_kind(name: impl Into<String>, kind: ArtifactKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Extension-stripped identifier used inside the remote project
    /// (`Config.gs` → `Config`, `lib/Util.gs` → `lib/Util`).
    pub fn remote_name(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() && !stem.ends_with('/') => stem,
            _ => &self.name,
        }
    }
}

impl fmt::Display for ArtifactSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Remote project
// ---------------------------------------------------------------------------

/// One file in the remote project's collection.
///
/// `file_type` stays a plain string: the remote side may report types this
/// tool does not manage, and those must be submitted back untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub file_type: String,
    #[serde(default)]
    pub source: String,
}

impl RemoteFile {
    pub fn new(name: impl Into<String>, kind: ArtifactKind, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_type: kind.as_remote_type().to_string(),
            source: source.into(),
        }
    }

    pub fn is_kind(&self, kind: ArtifactKind) -> bool {
        self.file_type == kind.as_remote_type()
    }
}

/// How a single artifact landed in the remote collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileOutcome {
    /// An existing entry with the same name and type was updated in place.
    Matched,
    /// No entry matched; a new one was appended.
    Created,
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileOutcome::Matched => write!(f, "updated"),
            ReconcileOutcome::Created => write!(f, "created"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(expiry: Option<DateTime<Utc>>) -> Credential {
        Credential {
            access_token: "ya29.secret-access".to_string(),
            refresh_token: "1//secret-refresh".to_string(),
            expiry,
            scope: None,
            token_type: Some("Bearer".to_string()),
        }
    }

    #[test]
    fn credential_without_expiry_is_fresh() {
        assert!(credential(None).is_fresh());
    }

    #[test]
    fn credential_freshness_compares_against_now() {
        let now = Utc::now();
        assert!(credential(Some(now + Duration::minutes(5))).is_fresh_at(now));
        assert!(!credential(Some(now - Duration::seconds(1))).is_fresh_at(now));
        assert!(!credential(Some(now)).is_fresh_at(now));
    }

    #[test]
    fn credential_expiring_within_skew_is_stale() {
        let now = Utc::now();
        assert!(!credential(Some(now + Duration::seconds(1))).is_fresh_at(now));
        assert!(!credential(Some(now + Duration::seconds(EXPIRY_SKEW_SECS))).is_fresh_at(now));
        assert!(credential(Some(now + Duration::seconds(EXPIRY_SKEW_SECS + 1))).is_fresh_at(now));
    }

    #[test]
    fn earliest_representable_expiry_is_stale() {
        assert!(!credential(Some(DateTime::<Utc>::MIN_UTC)).is_fresh());
    }

    #[test]
    fn credential_debug_redacts_tokens() {
        let rendered = format!("{:?}", credential(None));
        assert!(!rendered.contains("secret"), "leaked token: {rendered}");
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn credential_reads_snake_case_token_file() {
        let json = r#"{
            "access_token": "a",
            "refresh_token": "r",
            "scope": "https://www.googleapis.com/auth/script.projects",
            "token_type": "Bearer",
            "expiry_date": 1700000000000
        }"#;
        let cred: Credential = serde_json::from_str(json).expect("parse");
        assert_eq!(cred.access_token, "a");
        assert_eq!(cred.refresh_token, "r");
        assert_eq!(cred.expiry.map(|e| e.timestamp_millis()), Some(1_700_000_000_000));
    }

    #[test]
    fn credential_writes_camel_case_with_epoch_millis() {
        let expiry = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_123).unwrap();
        let json = serde_json::to_value(credential(Some(expiry))).expect("serialize");
        assert_eq!(json["accessToken"], "ya29.secret-access");
        assert_eq!(json["refreshToken"], "1//secret-refresh");
        assert_eq!(json["expiry"], 1_700_000_000_123_i64);
    }

    #[test]
    fn kind_is_inferred_from_extension() {
        assert_eq!(ArtifactSpec::new("Config.gs").kind, ArtifactKind::ServerJs);
        assert_eq!(ArtifactSpec::new("Sidebar.html").kind, ArtifactKind::Html);
        assert_eq!(ArtifactSpec::new("appsscript.json").kind, ArtifactKind::Json);
        assert_eq!(ArtifactSpec::new("Makefile").kind, ArtifactKind::ServerJs);
    }

    #[test]
    fn remote_name_strips_extension_only() {
        assert_eq!(ArtifactSpec::new("Config.gs").remote_name(), "Config");
        assert_eq!(ArtifactSpec::new("lib/Util.gs").remote_name(), "lib/Util");
        assert_eq!(ArtifactSpec::new("NoExt").remote_name(), "NoExt");
        assert_eq!(ArtifactSpec::new(".hidden").remote_name(), ".hidden");
    }

    #[test]
    fn remote_file_serializes_type_key() {
        let file = RemoteFile::new("Main", ArtifactKind::ServerJs, "function main() {}");
        let json = serde_json::to_value(&file).expect("serialize");
        assert_eq!(json["type"], "SERVER_JS");
        assert!(file.is_kind(ArtifactKind::ServerJs));
        assert!(!file.is_kind(ArtifactKind::Html));
    }

    #[test]
    fn artifact_kind_from_str() {
        assert_eq!("html".parse::<ArtifactKind>(), Ok(ArtifactKind::Html));
        assert_eq!("SERVER_JS".parse::<ArtifactKind>(), Ok(ArtifactKind::ServerJs));
        assert!("css".parse::<ArtifactKind>().is_err());
    }
}
