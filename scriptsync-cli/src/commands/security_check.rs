//! `scriptsync security-check`: look for exposed secrets.

use std::path::Path;

use anyhow::{bail, Result};
use colored::Colorize;

use scriptsync_audit::{run_audit, AuditReport, CheckStatus};

pub fn run() -> Result<()> {
    let dir = super::project_dir()?;
    let manifest = super::load_manifest(&dir)?;
    if !audit_and_print(&dir, &manifest.scan_files) {
        bail!("security issues found; fix them before committing");
    }
    Ok(())
}

/// Run the audit, print every check, return whether it passed.
pub(crate) fn audit_and_print(dir: &Path, scan_files: &[String]) -> bool {
    println!("{}\n", "🔒 Running security check...".bold());
    let report = run_audit(dir, scan_files);
    print_report(&report);

    println!("\n{}", super::rule("="));
    let passed = report.passed();
    if passed {
        println!("{}", "✅ Security check passed!".green().bold());
    } else {
        println!("{}", "❌ Security issues found! Please fix them.".red().bold());
    }
    passed
}

fn print_report(report: &AuditReport) {
    for check in &report.checks {
        let (mark, verdict) = match check.status {
            CheckStatus::Pass => ("✅".green(), "ok".green()),
            CheckStatus::Warn => ("⚠️ ".yellow(), "warning".yellow()),
            CheckStatus::Fail => ("❌".red(), "failed".red()),
        };
        println!("{mark} {}: {verdict}", check.name.bold());
        for finding in &check.findings {
            println!("   - {finding}");
        }
    }
}
