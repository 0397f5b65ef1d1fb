//! scriptsync core library: domain types, configuration, credential persistence.
//!
//! - [`types`]: credentials, artifact specs, remote file entries
//! - [`config`]: immutable run configuration built once at startup
//! - [`manifest`]: static artifact list and reporting inputs
//! - [`credential_store`]: owner-only JSON persistence of the delegated credential
//! - [`error`]: [`ConfigError`], [`StoreError`]

pub mod config;
pub mod credential_store;
pub mod error;
pub mod manifest;
pub mod types;

pub use config::{Config, Endpoints};
pub use credential_store::CredentialStore;
pub use error::{ConfigError, StoreError};
pub use manifest::Manifest;
pub use types::{ArtifactKind, ArtifactSpec, Credential, ReconcileOutcome, RemoteFile};
