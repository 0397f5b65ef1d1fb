//! `scriptsync update`: push every declared artifact into the remote project.

use anyhow::Result;
use colored::Colorize;

use scriptsync_core::{Config, Manifest};
use scriptsync_sync::{
    pipeline::{self, SyncEngine},
    ArtifactOutcome, CodePrompt, EnvPrompt, RunSummary,
};

use crate::prompt::StdinPrompt;

pub fn run() -> Result<()> {
    let dir = super::project_dir()?;
    let config = super::load_config(&dir)?;
    let manifest = super::load_manifest(&dir)?;

    println!("{}\n", "🚀 Starting script update...".bold());
    if config.remote_source().is_none() {
        println!(
            "{} GITHUB_REPO_URL is not set; only local sources will be used\n",
            "ℹ".bright_black()
        );
    }

    let summary = match config.auth_code.clone() {
        Some(code) => sync_with(&config, &manifest, EnvPrompt::new(code))?,
        None => sync_with(&config, &manifest, StdinPrompt)?,
    };

    println!("\n{}", "✨ Update complete!".bold());
    println!("{} {}", "✅ Updated:".green(), summary.updated);
    println!("{} {}", "❌ Failed:".red(), summary.failed);
    println!("\n🔗 {}", config.project_edit_url());
    println!(
        "\n{}",
        "🔒 Security reminder: Never commit .env, credentials.json, or token.json to Git!"
            .yellow()
    );
    Ok(())
}

fn sync_with<P: CodePrompt>(config: &Config, manifest: &Manifest, prompt: P) -> Result<RunSummary> {
    let mut engine = SyncEngine::from_config(config, prompt);
    let summary = pipeline::run(config, &manifest.artifacts, &mut engine, print_outcome)?;
    Ok(summary)
}

fn print_outcome(outcome: &ArtifactOutcome) {
    let name = &outcome.artifact;
    match &outcome.result {
        Ok(result) => {
            let source = outcome
                .tier
                .map(|tier| format!(" ({tier})"))
                .unwrap_or_default();
            println!("{} {name}{source}: {result}", "✅".green());
            if let Some(reason) = &outcome.local_failure {
                println!("   {} local copy skipped: {reason}", "ℹ".bright_black());
            }
        }
        Err(err) => println!("{} Failed to update {name}: {err}", "❌".red()),
    }
}
