//! Two-tier artifact content lookup: local working copy, then the raw
//! content host of the source repository.

use std::fmt;
use std::path::{Path, PathBuf};

use scriptsync_core::{ArtifactSpec, Config};

use crate::error::ResolveError;
use crate::http::HttpClient;

/// Where resolved content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTier {
    Local,
    Remote,
}

impl fmt::Display for SourceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceTier::Local => f.write_str("local"),
            SourceTier::Remote => f.write_str("remote"),
        }
    }
}

/// Content of one artifact plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub content: String,
    pub tier: SourceTier,
    /// Why the local tier was skipped, when the content is remote.
    pub local_failure: Option<String>,
}

#[derive(Debug, Clone)]
struct RemoteSource {
    base_url: String,
    branch: String,
}

#[derive(Debug, Clone)]
pub struct ArtifactResolver {
    source_dir: PathBuf,
    remote: Option<RemoteSource>,
    http: HttpClient,
}

impl ArtifactResolver {
    /// `remote_base` of `None` disables the remote tier.
    pub fn new(
        source_dir: impl Into<PathBuf>,
        remote_base: Option<&str>,
        branch: &str,
        http: HttpClient,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            remote: remote_base.map(|base| RemoteSource {
                base_url: base.trim_end_matches('/').to_string(),
                branch: branch.to_string(),
            }),
            http,
        }
    }

    pub fn from_config(config: &Config, http: HttpClient) -> Self {
        Self::new(
            &config.source_dir,
            config.remote_source(),
            &config.branch,
            http,
        )
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn local_path(&self, spec: &ArtifactSpec) -> PathBuf {
        self.source_dir.join(&spec.name)
    }

    /// `{repo}/raw/{branch}/{name}`, or `None` when no remote is configured.
    pub fn remote_url(&self, spec: &ArtifactSpec) -> Option<String> {
        self.remote
            .as_ref()
            .map(|r| format!("{}/raw/{}/{}", r.base_url, r.branch, spec.name))
    }

    /// Local first; on any local failure, the remote tier.
    pub fn resolve(&self, spec: &ArtifactSpec) -> Result<Resolved, ResolveError> {
        let local_failure = match self.read_local(spec) {
            Ok(content) => {
                tracing::debug!(artifact = %spec.name, "resolved from local source");
                return Ok(Resolved {
                    content,
                    tier: SourceTier::Local,
                    local_failure: None,
                });
            }
            Err(reason) => reason,
        };
        tracing::debug!(artifact = %spec.name, reason = %local_failure, "local source failed; trying remote");

        match self.fetch_remote(spec) {
            Ok(content) => Ok(Resolved {
                content,
                tier: SourceTier::Remote,
                local_failure: Some(local_failure),
            }),
            Err(remote) => Err(ResolveError::NotFound {
                name: spec.name.clone(),
                local: local_failure,
                remote,
            }),
        }
    }

    fn read_local(&self, spec: &ArtifactSpec) -> Result<String, String> {
        let path = self.local_path(spec);
        std::fs::read_to_string(&path).map_err(|e| format!("{}: {e}", path.display()))
    }

    fn fetch_remote(&self, spec: &ArtifactSpec) -> Result<String, String> {
        let url = self
            .remote_url(spec)
            .ok_or_else(|| "remote source not configured".to_string())?;
        self.http
            .get_text(&url, None)
            .map_err(|e| format!("{url}: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::http::RetryPolicy;

    fn http() -> HttpClient {
        HttpClient::new(Duration::from_secs(5)).with_retry(RetryPolicy::none())
    }

    #[test]
    fn local_file_wins_without_remote_request() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("Config.gs"), "var CONFIG = {};").expect("seed");
        let mut server = mockito::Server::new();
        let remote = server.mock("GET", mockito::Matcher::Any).expect(0).create();

        let resolver = ArtifactResolver::new(dir.path(), Some(&server.url()), "main", http());
        let resolved = resolver.resolve(&ArtifactSpec::new("Config.gs")).expect("resolve");

        assert_eq!(resolved.content, "var CONFIG = {};");
        assert_eq!(resolved.tier, SourceTier::Local);
        assert_eq!(resolved.local_failure, None);
        remote.assert();
    }

    #[test]
    fn missing_local_falls_back_to_remote() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut server = mockito::Server::new();
        let remote = server
            .mock("GET", "/raw/main/Utils.gs")
            .with_body("function util() {}")
            .expect(1)
            .create();

        let resolver = ArtifactResolver::new(dir.path(), Some(&server.url()), "main", http());
        let resolved = resolver.resolve(&ArtifactSpec::new("Utils.gs")).expect("resolve");

        assert_eq!(resolved.content, "function util() {}");
        assert_eq!(resolved.tier, SourceTier::Remote);
        assert!(resolved
            .local_failure
            .as_deref()
            .is_some_and(|r| r.contains("Utils.gs")));
        remote.assert();
    }

    #[test]
    fn both_tiers_failing_names_both_reasons() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut server = mockito::Server::new();
        server.mock("GET", "/raw/dev/Gone.gs").with_status(404).create();

        let resolver = ArtifactResolver::new(dir.path(), Some(&server.url()), "dev", http());
        let err = resolver.resolve(&ArtifactSpec::new("Gone.gs")).unwrap_err();

        let ResolveError::NotFound { name, local, remote } = &err;
        assert_eq!(name, "Gone.gs");
        assert!(!local.is_empty());
        assert!(remote.contains("404"), "got: {remote}");
        let rendered = err.to_string();
        assert!(rendered.contains("local") && rendered.contains("remote"));
    }

    #[test]
    fn unconfigured_remote_fails_without_network() {
        let dir = tempfile::tempdir().expect("tempdir");
        let resolver = ArtifactResolver::new(dir.path(), None, "main", http());
        let ResolveError::NotFound { remote, .. } =
            resolver.resolve(&ArtifactSpec::new("Main.gs")).unwrap_err();
        assert_eq!(remote, "remote source not configured");
    }

    #[test]
    fn remote_url_trims_trailing_slash() {
        let resolver = ArtifactResolver::new("/src", Some("https://github.com/acme/fin/"), "main", http());
        assert_eq!(
            resolver.remote_url(&ArtifactSpec::new("Main.gs")).as_deref(),
            Some("https://github.com/acme/fin/raw/main/Main.gs")
        );
    }
}
