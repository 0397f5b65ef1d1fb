//! `scriptsync status`: local configuration, credential and source visibility.
//!
//! Never touches the network.

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use scriptsync_core::{
    config::is_placeholder, manifest::MANIFEST_FILE, Config, CredentialStore, Manifest, StoreError,
};

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "setting")]
    key: &'static str,
    #[tabled(rename = "value")]
    value: String,
    #[tabled(rename = "state")]
    state: String,
}

#[derive(Tabled)]
struct SourceRow {
    #[tabled(rename = "artifact")]
    name: String,
    #[tabled(rename = "kind")]
    kind: String,
    #[tabled(rename = "local")]
    local: String,
}

pub fn run() -> Result<()> {
    let dir = super::project_dir()?;
    let config = super::load_config(&dir)?;
    let manifest = super::load_manifest(&dir)?;

    println!(
        "scriptsync v{} | {} artifacts | manifest: {}",
        env!("CARGO_PKG_VERSION"),
        manifest.artifacts.len(),
        if Manifest::path_at(&dir).exists() { MANIFEST_FILE } else { "built-in defaults" },
    );
    let separator = "■".repeat(60).bright_black().to_string();
    println!("{separator}");

    println!("{}", "CONFIGURATION".bold());
    let mut table = Table::new(settings(&config));
    table.with(Style::rounded());
    println!("{table}");
    println!("{separator}");

    println!("{}", "CREDENTIAL".bold());
    println!("{} {}", config.token_path.display(), credential_state(&config));
    println!("{separator}");

    println!("{}", "SOURCES".bold());
    let (rows, missing) = sources(&config, &manifest);
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if missing > 0 {
        match config.remote_source() {
            Some(remote) => println!(
                "{missing} artifact(s) not found locally; `scriptsync update` will fetch them from {remote}."
            ),
            None => println!(
                "{missing} artifact(s) not found locally and no remote source is configured."
            ),
        }
    }
    if config.validate().is_err() {
        println!("Run 'scriptsync setup' to fill in the missing configuration.");
    }
    Ok(())
}

fn settings(config: &Config) -> Vec<SettingRow> {
    let row = |key: &'static str, value: &str, secret: bool| SettingRow {
        key,
        value: if secret && !is_placeholder(value) {
            "<set>".to_string()
        } else {
            value.to_string()
        },
        state: setting_state(value),
    };
    vec![
        row("GOOGLE_CLIENT_ID", &config.client_id, false),
        row("GOOGLE_CLIENT_SECRET", &config.client_secret, true),
        row("GOOGLE_REDIRECT_URI", &config.redirect_uri, false),
        row("GOOGLE_SCRIPT_ID", &config.script_id, false),
        row("GITHUB_REPO_URL", config.repo_url.as_deref().unwrap_or(""), false),
        row("GITHUB_BRANCH", &config.branch, false),
    ]
}

fn setting_state(value: &str) -> String {
    if value.trim().is_empty() {
        "missing".red().to_string()
    } else if is_placeholder(value) {
        "placeholder".yellow().to_string()
    } else {
        "ok".green().to_string()
    }
}

fn credential_state(config: &Config) -> String {
    match CredentialStore::new(&config.token_path).load() {
        Ok(cred) => match cred.expiry {
            None => "present, no expiry".green().to_string(),
            Some(expiry) if cred.is_fresh() => {
                let minutes = (expiry - Utc::now()).num_minutes();
                format!("valid for {minutes} more minute(s)").green().to_string()
            }
            Some(_) if cred.can_refresh() => "expired, will refresh on next run".yellow().to_string(),
            Some(_) => "expired, consent required".red().to_string(),
        },
        Err(StoreError::NotFound { .. }) => "missing, consent required".yellow().to_string(),
        Err(err) => format!("unusable ({err})").red().to_string(),
    }
}

fn sources(config: &Config, manifest: &Manifest) -> (Vec<SourceRow>, usize) {
    let mut missing = 0;
    let rows = manifest
        .artifacts
        .iter()
        .map(|spec| {
            let path = config.source_dir.join(&spec.name);
            let local = match std::fs::metadata(&path) {
                Ok(meta) if meta.is_file() => format!("{} B", meta.len()).green().to_string(),
                _ => {
                    missing += 1;
                    "missing".red().to_string()
                }
            };
            SourceRow {
                name: spec.name.clone(),
                kind: spec.kind.to_string(),
                local,
            }
        })
        .collect();
    (rows, missing)
}
