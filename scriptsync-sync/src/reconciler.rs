//! Full-collection replace of the remote project's files.
//!
//! The remote API only accepts the whole file list, so each artifact costs one
//! fetch and one submit. Entries this tool does not manage (other names, other
//! types) are submitted back unchanged. There is no concurrency token: a
//! concurrent editor's change between fetch and submit is overwritten.

use scriptsync_core::{ArtifactSpec, Credential, ReconcileOutcome, RemoteFile};

use crate::error::RemoteApiError;

/// Remote project content operations.
pub trait ProjectApi {
    fn get_content(&self, access_token: &str, script_id: &str)
        -> Result<Vec<RemoteFile>, RemoteApiError>;

    fn update_content(
        &self,
        access_token: &str,
        script_id: &str,
        files: &[RemoteFile],
    ) -> Result<(), RemoteApiError>;
}

impl<A: ProjectApi + ?Sized> ProjectApi for &A {
    fn get_content(&self, access_token: &str, script_id: &str) -> Result<Vec<RemoteFile>, RemoteApiError> {
        (**self).get_content(access_token, script_id)
    }

    fn update_content(
        &self,
        access_token: &str,
        script_id: &str,
        files: &[RemoteFile],
    ) -> Result<(), RemoteApiError> {
        (**self).update_content(access_token, script_id, files)
    }
}

/// Upsert `content` for `spec` into `files` by (remote name, type).
pub fn apply_artifact(files: &mut Vec<RemoteFile>, spec: &ArtifactSpec, content: &str) -> ReconcileOutcome {
    let remote_name = spec.remote_name();
    match files
        .iter_mut()
        .find(|f| f.name == remote_name && f.is_kind(spec.kind))
    {
        Some(existing) => {
            existing.source = content.to_string();
            ReconcileOutcome::Matched
        }
        None => {
            files.push(RemoteFile::new(remote_name, spec.kind, content));
            ReconcileOutcome::Created
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProjectReconciler<A> {
    api: A,
    script_id: String,
}

impl<A: ProjectApi> ProjectReconciler<A> {
    pub fn new(api: A, script_id: impl Into<String>) -> Self {
        Self {
            api,
            script_id: script_id.into(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn script_id(&self) -> &str {
        &self.script_id
    }

    /// Fetch, upsert one artifact, submit. Never caches the collection.
    pub fn reconcile(
        &self,
        credential: &Credential,
        spec: &ArtifactSpec,
        content: &str,
    ) -> Result<ReconcileOutcome, RemoteApiError> {
        let token = credential.access_token.as_str();
        let mut files = self.api.get_content(token, &self.script_id)?;
        let before = files.len();
        let outcome = apply_artifact(&mut files, spec, content);
        tracing::debug!(
            artifact = %spec.name,
            %outcome,
            before,
            after = files.len(),
            "submitting project content"
        );
        self.api.update_content(token, &self.script_id, &files)?;
        Ok(outcome)
    }
}
