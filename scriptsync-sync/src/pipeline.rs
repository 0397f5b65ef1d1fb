//! Run orchestration: validate, authenticate once, then resolve and
//! reconcile every artifact in declared order.
//!
//! A 401 from the project API renews the credential and retries that
//! artifact once. After a failed renewal the run keeps the old credential
//! and stops renewing.

use scriptsync_core::{ArtifactSpec, Config, Credential, CredentialStore, ReconcileOutcome};

use crate::auth::{Authenticator, CodePrompt, OAuthClient, TokenEndpoint};
use crate::error::{ArtifactError, RemoteApiError, SyncError};
use crate::http::HttpClient;
use crate::reconciler::{ProjectApi, ProjectReconciler};
use crate::resolver::{ArtifactResolver, SourceTier};
use crate::script_api::ScriptApiClient;

/// Result for one artifact of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactOutcome {
    pub artifact: String,
    /// Tier the content came from; `None` when resolution failed.
    pub tier: Option<SourceTier>,
    pub local_failure: Option<String>,
    pub result: Result<ReconcileOutcome, ArtifactError>,
}

impl ArtifactOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Counts plus per-artifact detail of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub updated: usize,
    pub failed: usize,
    pub outcomes: Vec<ArtifactOutcome>,
}

/// The wired collaborators of a run.
pub struct SyncEngine<E, P, A> {
    pub authenticator: Authenticator<E, P>,
    pub resolver: ArtifactResolver,
    pub reconciler: ProjectReconciler<A>,
}

impl<P: CodePrompt> SyncEngine<OAuthClient, P, ScriptApiClient> {
    /// Production wiring from configuration. Performs no I/O.
    pub fn from_config(config: &Config, prompt: P) -> Self {
        let http = HttpClient::new(config.http_timeout);
        Self {
            authenticator: Authenticator::new(
                CredentialStore::new(&config.token_path),
                OAuthClient::from_config(config, http.clone()),
                prompt,
            ),
            resolver: ArtifactResolver::from_config(config, http.clone()),
            reconciler: ProjectReconciler::new(
                ScriptApiClient::from_config(config, http),
                &config.script_id,
            ),
        }
    }
}

/// Execute one sync run.
///
/// Configuration and authentication failures abort before any artifact is
/// touched. Per-artifact failures are recorded, counted and skipped.
/// `on_outcome` sees each outcome as soon as it is known.
pub fn run<E, P, A>(
    config: &Config,
    artifacts: &[ArtifactSpec],
    engine: &mut SyncEngine<E, P, A>,
    mut on_outcome: impl FnMut(&ArtifactOutcome),
) -> Result<RunSummary, SyncError>
where
    E: TokenEndpoint,
    P: CodePrompt,
    A: ProjectApi,
{
    config.validate()?;
    let mut session = Session {
        credential: engine.authenticator.obtain_credential()?,
        renewal_failed: false,
    };
    tracing::info!(artifacts = artifacts.len(), script_id = %config.script_id, "sync run started");

    let mut summary = RunSummary::default();
    for spec in artifacts {
        let outcome = sync_artifact(engine, &mut session, spec);
        if outcome.is_success() {
            summary.updated += 1;
        } else {
            summary.failed += 1;
        }
        if let Err(err) = &outcome.result {
            tracing::warn!(artifact = %spec.name, error = %err, "artifact failed");
        }
        on_outcome(&outcome);
        summary.outcomes.push(outcome);
    }

    tracing::info!(updated = summary.updated, failed = summary.failed, "sync run finished");
    Ok(summary)
}

/// Credential in use by a run.
struct Session {
    credential: Credential,
    renewal_failed: bool,
}

fn sync_artifact<E, P, A>(
    engine: &mut SyncEngine<E, P, A>,
    session: &mut Session,
    spec: &ArtifactSpec,
) -> ArtifactOutcome
where
    E: TokenEndpoint,
    P: CodePrompt,
    A: ProjectApi,
{
    let resolved = match engine.resolver.resolve(spec) {
        Ok(resolved) => resolved,
        Err(err) => {
            return ArtifactOutcome {
                artifact: spec.name.clone(),
                tier: None,
                local_failure: None,
                result: Err(err.into()),
            }
        }
    };
    let result = reconcile_renewing(engine, session, spec, &resolved.content)
        .map_err(ArtifactError::from);
    ArtifactOutcome {
        artifact: spec.name.clone(),
        tier: Some(resolved.tier),
        local_failure: resolved.local_failure,
        result,
    }
}

fn reconcile_renewing<E, P, A>(
    engine: &mut SyncEngine<E, P, A>,
    session: &mut Session,
    spec: &ArtifactSpec,
    content: &str,
) -> Result<ReconcileOutcome, RemoteApiError>
where
    E: TokenEndpoint,
    P: CodePrompt,
    A: ProjectApi,
{
    match engine.reconciler.reconcile(&session.credential, spec, content) {
        Err(err) if err.status == Some(401) && !session.renewal_failed => {
            tracing::info!(artifact = %spec.name, "access token rejected; refreshing");
            match engine.authenticator.refresh_rejected(&session.credential) {
                Ok(renewed) => {
                    session.credential = renewed;
                    engine.reconciler.reconcile(&session.credential, spec, content)
                }
                Err(auth_err) => {
                    tracing::warn!(error = %auth_err, "credential renewal failed");
                    session.renewal_failed = true;
                    Err(err)
                }
            }
        }
        result => result,
    }
}
