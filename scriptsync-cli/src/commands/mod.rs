//! Subcommand implementations and the helpers they share.

pub mod check_connection;
pub mod check_scripts;
pub mod check_sheets;
pub mod security_check;
pub mod setup;
pub mod status;
pub mod update;

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;

use scriptsync_core::{Config, Credential, CredentialStore, Manifest};
use scriptsync_sync::{Authenticator, HttpClient, NoPrompt, OAuthClient};

pub(crate) fn project_dir() -> Result<PathBuf> {
    std::env::current_dir().context("could not determine current directory")
}

pub(crate) fn load_config(project_dir: &std::path::Path) -> Result<Config> {
    Config::load(project_dir).context("failed to load configuration")
}

pub(crate) fn load_manifest(project_dir: &std::path::Path) -> Result<Manifest> {
    Manifest::load_at(project_dir).context("failed to load manifest")
}

/// Credential for the read-only tools. Refreshes when stale but never starts a
/// consent flow.
pub(crate) fn reporting_credential(config: &Config, http: &HttpClient) -> Result<Credential> {
    config.validate()?;
    println!("🔐 Authorizing...");
    let mut auth = Authenticator::new(
        CredentialStore::new(&config.token_path),
        OAuthClient::from_config(config, http.clone()),
        NoPrompt::new(&config.token_path),
    );
    let credential = auth.obtain_credential()?;
    println!("{}\n", "✅ Authorized".green());
    Ok(credential)
}

pub(crate) fn rule(ch: &str) -> String {
    ch.repeat(60)
}
