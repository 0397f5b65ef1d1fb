//! `scriptsync check-connection`: project metadata and container binding.

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;

use scriptsync_sync::{HttpClient, ScriptApiClient};

use super::rule;

pub fn run() -> Result<()> {
    let dir = super::project_dir()?;
    let config = super::load_config(&dir)?;

    println!("{}\n", "🔍 Checking Apps Script project binding...".bold());
    println!("📋 Script ID: {}\n", config.script_id);

    let http = HttpClient::new(config.http_timeout);
    let credential = super::reporting_credential(&config, &http)?;

    println!("📥 Fetching project metadata...");
    let client = ScriptApiClient::from_config(&config, http);
    let project = client.get_project(&credential.access_token, &config.script_id)?;

    println!("\n{}", rule("="));
    println!("📊 Project:");
    println!("{}", rule("="));
    println!(
        "Title:   {}",
        if project.title.is_empty() { "(untitled)" } else { project.title.as_str() }
    );
    println!("Created: {}", format_time(project.create_time));
    println!("Updated: {}", format_time(project.update_time));

    match &project.parent_id {
        Some(parent) => {
            println!("\n📎 Bound to a Drive file");
            println!("Parent ID: {parent}");
        }
        None => {
            println!("\n📎 Standalone project (not bound to a file)");
            println!(
                "{}",
                "⚠️  The project is not bound to a spreadsheet.".yellow()
            );
            println!("\n💡 Open the spreadsheet, choose Extensions → Apps Script,");
            println!("   and point GOOGLE_SCRIPT_ID at that project.");
        }
    }

    println!("\n{}", rule("="));
    println!("🔗 Links:");
    println!("{}", rule("="));
    println!("Apps Script project:\n   {}", config.project_edit_url());
    if let Some(parent) = &project.parent_id {
        println!("\nDrive file:\n   https://drive.google.com/file/d/{parent}/view");
    }
    println!();
    Ok(())
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "(unknown)".to_string())
}
