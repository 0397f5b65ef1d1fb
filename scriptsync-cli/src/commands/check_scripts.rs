//! `scriptsync check-scripts`: remote project files against the manifest.

use anyhow::Result;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use scriptsync_core::{ArtifactKind, RemoteFile};
use scriptsync_sync::{HttpClient, ProjectApi, ScriptApiClient};

use super::rule;

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "")]
    mark: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "type")]
    file_type: String,
    #[tabled(rename = "size")]
    size: String,
}

pub fn run() -> Result<()> {
    let dir = super::project_dir()?;
    let config = super::load_config(&dir)?;
    let manifest = super::load_manifest(&dir)?;

    println!("{}\n", "🔍 Checking Apps Script project...".bold());
    println!("📋 Script ID: {}\n", config.script_id);

    let http = HttpClient::new(config.http_timeout);
    let credential = super::reporting_credential(&config, &http)?;

    println!("📥 Fetching project files...");
    let client = ScriptApiClient::from_config(&config, http);
    let files = client.get_content(&credential.access_token, &config.script_id)?;
    println!("\n📊 Files in project: {}\n", files.len());

    let expected = manifest.expected_script_names();
    print_files(&files, &expected);

    println!("\n{}", rule("="));
    println!("📋 Expected scripts:");
    println!("{}", rule("="));
    let missing = missing_scripts(&files, &expected);
    for name in &expected {
        if missing.contains(name) {
            println!("   {} {name} - {}", "❌".red(), "MISSING".red());
        } else {
            println!("   {} {name}", "✅".green());
        }
    }

    println!("\n{}", rule("="));
    if missing.is_empty() {
        println!("{}", "✅ All expected scripts are present in the project!".green());
    } else {
        println!(
            "{}",
            format!("⚠️  Missing scripts: {} of {}", missing.len(), expected.len()).yellow()
        );
        println!("\n💡 Push them with:\n   scriptsync update");
    }
    println!("\n🔗 {}\n", config.project_edit_url());
    Ok(())
}

fn print_files(files: &[RemoteFile], expected: &[&str]) {
    let mut rows: Vec<FileRow> = files
        .iter()
        .map(|f| {
            let is_script = f.is_kind(ArtifactKind::ServerJs);
            let mark = match (is_script, expected.contains(&f.name.as_str())) {
                (true, true) => "✅",
                (true, false) => "⚠️",
                (false, _) => "·",
            };
            FileRow {
                mark: mark.to_string(),
                name: if f.name.is_empty() { "(unnamed)".to_string() } else { f.name.clone() },
                file_type: f.file_type.clone(),
                size: format!("{} B", f.source.len()),
            }
        })
        .collect();
    if rows.is_empty() {
        println!("   {} No files found in the project", "❌".red());
        return;
    }
    rows.sort_by(|a, b| a.file_type.cmp(&b.file_type).then_with(|| a.name.cmp(&b.name)));
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

/// Expected script names with no server-logic file of that name.
fn missing_scripts<'a>(files: &[RemoteFile], expected: &[&'a str]) -> Vec<&'a str> {
    expected
        .iter()
        .copied()
        .filter(|name| {
            !files
                .iter()
                .any(|f| f.name == *name && f.is_kind(ArtifactKind::ServerJs))
        })
        .collect()
}
