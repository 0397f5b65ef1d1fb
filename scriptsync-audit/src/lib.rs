//! Secret-exposure checks for a scriptsync project directory.
//!
//! `run_audit(dir, scan_files)` runs four checks in order and returns one
//! [`CheckReport`] per check. The first three decide the overall verdict; the
//! permissions check only warns.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use scriptsync_core::config::{ENV_FILE, TOKEN_FILE};

/// Files that hold secrets and must never be committed.
pub const SENSITIVE_FILES: &[&str] = &[
    ENV_FILE,
    "credentials.json",
    TOKEN_FILE,
    "token.pickle",
    ".env.local",
    ".env.production",
];

struct SecretPattern {
    label: &'static str,
    regex: Regex,
}

static SECRET_PATTERNS: Lazy<Vec<SecretPattern>> = Lazy::new(|| {
    [
        ("client_id assignment", r#"(?i)client_id.*=.*['"][^'"]{20,}['"]"#),
        ("client_secret assignment", r#"(?i)client_secret.*=.*['"][^'"]{20,}['"]"#),
        ("api_key assignment", r#"(?i)api_key.*=.*['"][^'"]{10,}['"]"#),
        ("password assignment", r#"(?i)password.*=.*['"][^'"]{5,}['"]"#),
        ("token assignment", r#"(?i)token.*=.*['"][^'"]{20,}['"]"#),
        ("secret assignment", r#"(?i)secret.*=.*['"][^'"]{10,}['"]"#),
        ("GOOGLE_CLIENT_ID value", r"(?i)GOOGLE_CLIENT_ID.*=.*[^_]{20,}"),
        ("GOOGLE_CLIENT_SECRET value", r"(?i)GOOGLE_CLIENT_SECRET.*=.*[^_]{20,}"),
    ]
    .into_iter()
    .map(|(label, pattern)| SecretPattern {
        label,
        regex: Regex::new(pattern).expect("static secret pattern"),
    })
    .collect()
});

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    /// Worth a look; does not fail the audit.
    Warn,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub name: &'static str,
    pub status: CheckStatus,
    pub findings: Vec<String>,
}

impl CheckReport {
    fn from_findings(name: &'static str, findings: Vec<String>, failing: CheckStatus) -> Self {
        let status = if findings.is_empty() {
            CheckStatus::Pass
        } else {
            failing
        };
        Self {
            name,
            status,
            findings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    pub checks: Vec<CheckReport>,
}

impl AuditReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.status != CheckStatus::Fail)
    }
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("git is not available: {0}")]
    GitUnavailable(#[source] std::io::Error),

    #[error("git ls-files failed: {0}")]
    GitFailed(String),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run every check against `project_dir`. `scan_files` are relative to it.
pub fn run_audit(project_dir: &Path, scan_files: &[String]) -> AuditReport {
    AuditReport {
        checks: vec![
            check_gitignore(project_dir),
            check_git_tracking(project_dir),
            check_secrets(project_dir, scan_files),
            check_permissions(project_dir),
        ],
    }
}

/// Every sensitive file must be covered by a `.gitignore` entry.
pub fn check_gitignore(project_dir: &Path) -> CheckReport {
    const NAME: &str = ".gitignore";
    let path = project_dir.join(".gitignore");
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            return CheckReport {
                name: NAME,
                status: CheckStatus::Fail,
                findings: vec![format!("cannot read .gitignore: {e}")],
            }
        }
    };
    let entries: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with('!'))
        .collect();

    let findings = SENSITIVE_FILES
        .iter()
        .filter(|file| !entries.iter().any(|entry| ignores(entry, file)))
        .map(|file| format!("{file} is not listed in .gitignore"))
        .collect();
    CheckReport::from_findings(NAME, findings, CheckStatus::Fail)
}

/// No sensitive file may be tracked by git. Missing git is a warning.
pub fn check_git_tracking(project_dir: &Path) -> CheckReport {
    const NAME: &str = "git tracking";
    let tracked = match tracked_files(project_dir) {
        Ok(tracked) => tracked,
        Err(err) => {
            tracing::debug!(error = %err, "skipping git tracking check");
            return CheckReport {
                name: NAME,
                status: CheckStatus::Warn,
                findings: vec![err.to_string()],
            };
        }
    };

    let findings = tracked
        .iter()
        .filter(|path| {
            let base = path.rsplit('/').next().unwrap_or("");
            SENSITIVE_FILES.contains(&base)
        })
        .map(|path| format!("{path} is tracked by git; remove it with `git rm --cached {path}`"))
        .collect();
    CheckReport::from_findings(NAME, findings, CheckStatus::Fail)
}

/// Scan source files for embedded credentials. Absent files are skipped.
pub fn check_secrets(project_dir: &Path, scan_files: &[String]) -> CheckReport {
    let mut findings = Vec::new();
    for file in scan_files {
        let path = project_dir.join(file);
        if !path.exists() {
            continue;
        }
        match read_scan_file(&path) {
            Ok(content) => {
                for label in scan_content(&content) {
                    findings.push(format!("{file}: possible {label}"));
                }
            }
            Err(err) => findings.push(err.to_string()),
        }
    }
    CheckReport::from_findings("secrets in code", findings, CheckStatus::Fail)
}

/// Labels of every secret pattern that matches `content`.
pub fn scan_content(content: &str) -> Vec<&'static str> {
    SECRET_PATTERNS
        .iter()
        .filter(|p| p.regex.is_match(content))
        .map(|p| p.label)
        .collect()
}

/// Sensitive files on disk should be owner-only. Warning only.
pub fn check_permissions(project_dir: &Path) -> CheckReport {
    let mut findings = Vec::new();
    for file in SENSITIVE_FILES {
        let path = project_dir.join(file);
        if let Some(mode) = exposed_mode(&path) {
            findings.push(format!(
                "{file} is readable by group or others (mode {mode:o}); run `chmod 600 {file}`"
            ));
        }
    }
    CheckReport::from_findings("file permissions", findings, CheckStatus::Warn)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ignores(entry: &str, file: &str) -> bool {
    let entry = entry
        .trim_start_matches("**/")
        .trim_start_matches('/')
        .trim_end_matches('/');
    match entry.strip_suffix('*') {
        Some(prefix) => file.starts_with(prefix),
        None => entry == file,
    }
}

fn tracked_files(project_dir: &Path) -> Result<Vec<String>, AuditError> {
    let output = Command::new("git")
        .arg("-C")
        .arg(project_dir)
        .args(["ls-files", "-z"])
        .output()
        .map_err(AuditError::GitUnavailable)?;
    if !output.status.success() {
        return Err(AuditError::GitFailed(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout)
        .split('\0')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}

fn read_scan_file(path: &Path) -> Result<String, AuditError> {
    fs::read_to_string(path).map_err(|source| AuditError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(unix)]
fn exposed_mode(path: &Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    let mode = fs::metadata(path).ok()?.permissions().mode() & 0o777;
    (mode & 0o077 != 0).then_some(mode)
}

#[cfg(not(unix))]
fn exposed_mode(_path: &Path) -> Option<u32> {
    None
}
