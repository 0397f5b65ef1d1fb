//! scriptsync: keep a hosted Apps Script project in step with local sources.
//!
//! # Usage
//!
//! ```text
//! scriptsync update            push every declared artifact into the project
//! scriptsync check-scripts     list project files against the manifest
//! scriptsync check-connection  show project metadata and its container
//! scriptsync check-sheets      compare spreadsheet tabs with the manifest
//! scriptsync security-check    look for exposed secrets
//! scriptsync status            local configuration, credential and sources
//! scriptsync setup             interactive first-time configuration
//! ```
//!
//! Every command works on the current directory. Log verbosity follows
//! `SCRIPTSYNC_LOG` (default `warn`); logs go to stderr.

mod commands;
mod prompt;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "scriptsync",
    version,
    about = "Sync local Apps Script sources into a hosted script project",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Push every declared artifact into the remote project.
    Update,

    /// List the files of the remote project against the expected scripts.
    CheckScripts,

    /// Show remote project metadata and its container document.
    CheckConnection,

    /// Compare the spreadsheet's sheets with the expected list.
    CheckSheets,

    /// Check the project directory for exposed secrets.
    SecurityCheck,

    /// Show local configuration, credential and source status.
    Status,

    /// Interactive first-time configuration.
    Setup,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Update => commands::update::run(),
        Commands::CheckScripts => commands::check_scripts::run(),
        Commands::CheckConnection => commands::check_connection::run(),
        Commands::CheckSheets => commands::check_sheets::run(),
        Commands::SecurityCheck => commands::security_check::run(),
        Commands::Status => commands::status::run(),
        Commands::Setup => commands::setup::run(),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "💥 Fatal error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_env("SCRIPTSYNC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
