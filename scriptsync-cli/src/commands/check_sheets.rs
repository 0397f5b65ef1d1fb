//! `scriptsync check-sheets`: spreadsheet tabs against the expected list.

use anyhow::{Context, Result};
use colored::Colorize;

use scriptsync_sync::{HttpClient, SheetsClient};

use super::rule;

pub fn run() -> Result<()> {
    let dir = super::project_dir()?;
    let config = super::load_config(&dir)?;
    let manifest = super::load_manifest(&dir)?;
    let spreadsheet_url = format!(
        "https://docs.google.com/spreadsheets/d/{}/edit",
        manifest.spreadsheet_id
    );

    println!("{}\n", "🔍 Checking spreadsheet status...".bold());

    let http = HttpClient::new(config.http_timeout);
    let credential = super::reporting_credential(&config, &http)?;

    println!("📥 Fetching spreadsheet metadata...");
    let client = SheetsClient::from_config(&config, http);
    let info = match client.get_spreadsheet(&credential.access_token, &manifest.spreadsheet_id) {
        Ok(info) => info,
        Err(err) if err.status == Some(403) => {
            println!("\n💡 The authorized account cannot read this spreadsheet.");
            println!("   Delete token.json and run `scriptsync update` to grant spreadsheet access,");
            println!("   or share the spreadsheet with the authorized account.");
            return Err(err).context("spreadsheet access denied");
        }
        Err(err) => return Err(err).context("failed to read spreadsheet"),
    };

    println!("\n{}", rule("="));
    println!("📊 Spreadsheet: {}", info.title);
    println!("Sheets: {}", info.sheets.len());
    println!("{}", rule("─"));
    for (n, sheet) in info.sheets.iter().enumerate() {
        println!("   {}. {}", n + 1, sheet.title);
    }

    println!("\n{}", rule("="));
    println!("📋 Expected sheets:");
    println!("{}", rule("="));
    let missing = info.missing(&manifest.expected_sheets);
    for name in &manifest.expected_sheets {
        if missing.contains(&name.as_str()) {
            println!("   {} {name} - {}", "❌".red(), "MISSING".red());
        } else {
            println!("   {} {name}", "✅".green());
        }
    }

    let total = manifest.expected_sheets.len();
    println!("\n{}", rule("="));
    if missing.is_empty() {
        println!("{}", "✅ All expected sheets are present; the system is initialized.".green());
    } else {
        println!(
            "{}",
            format!("⚠️  Missing sheets: {} of {total}", missing.len()).yellow()
        );
        println!("✅ Found: {} of {total}", total - missing.len());
        println!("\n💡 Initialize the system:");
        println!("   1. Open {spreadsheet_url}");
        println!("   2. Extensions → Apps Script");
        println!("   3. Select initializeSystem and press Run");
    }

    let extra = info.extra(&manifest.expected_sheets);
    if !extra.is_empty() {
        println!("\nℹ️  Additional sheets ({}):", extra.len());
        for name in extra {
            println!("   - {name}");
        }
    }

    println!("\n🔗 Links:");
    println!("{}", rule("─"));
    println!("Spreadsheet:\n   {spreadsheet_url}");
    println!("\nApps Script:\n   {}\n", config.project_edit_url());
    Ok(())
}
