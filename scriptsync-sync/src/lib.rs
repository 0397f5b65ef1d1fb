//! # scriptsync-sync
//!
//! Credential lifecycle, artifact resolution and remote project
//! reconciliation.
//!
//! Call [`pipeline::run`] with a [`SyncEngine`] built by
//! [`SyncEngine::from_config`] to push every declared artifact into the
//! remote project. The reporting tools reuse [`Authenticator`],
//! [`ScriptApiClient`] and [`SheetsClient`] directly.

pub mod auth;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod reconciler;
pub mod resolver;
pub mod script_api;
pub mod sheets_api;

pub use auth::{AuthState, Authenticator, CodePrompt, EnvPrompt, NoPrompt, OAuthClient, TokenEndpoint};
pub use error::{ArtifactError, AuthError, HttpError, RemoteApiError, ResolveError, SyncError};
pub use http::{HttpClient, RetryPolicy};
pub use pipeline::{ArtifactOutcome, RunSummary, SyncEngine};
pub use reconciler::{ProjectApi, ProjectReconciler};
pub use resolver::{ArtifactResolver, Resolved, SourceTier};
pub use script_api::{ProjectMetadata, ScriptApiClient};
pub use sheets_api::{SheetInfo, SheetsClient, SpreadsheetInfo};
