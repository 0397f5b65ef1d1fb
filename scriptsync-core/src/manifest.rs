//! Static artifact list and reporting inputs.
//!
//! Read from `<project_dir>/scriptsync.yaml` when present:
//!
//! ```yaml
//! artifacts:
//!   - Config.gs
//!   - Main.gs
//!   - name: Sidebar.html
//!   - name: Legacy.txt
//!     kind: SERVER_JS
//! spreadsheet_id: 1lY1GZ_...
//! expected_sheets: [Currencies, Payments]
//! scan_files: [Config.gs, Main.gs]
//! ```
//!
//! Without the file the built-in defaults apply. Artifact order is the
//! processing order of a run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{ArtifactKind, ArtifactSpec};

pub const MANIFEST_FILE: &str = "scriptsync.yaml";

const DEFAULT_ARTIFACTS: &[&str] = &[
    "Config.gs",
    "Utils.gs",
    "Main.gs",
    "CurrencyManager.gs",
    "VATCalculator.gs",
    "PaymentManager.gs",
    "DebtCalculator.gs",
    "Notifications.gs",
    "Triggers.gs",
    "VersionManager.gs",
    "UpdateManager.gs",
    "MigrationScripts.gs",
    "CSVImporter.gs",
    "OptimizedSetup.gs",
];

const DEFAULT_SHEETS: &[&str] = &[
    "Currencies",
    "Exchange_Rates",
    "VAT_Rates",
    "Companies",
    "Counterparties",
    "Products",
    "Expense_Categories",
    "Purchase_Orders",
    "Purchase_Order_Lines",
    "Sales_Orders",
    "Sales_Order_LINES",
    "Expenses",
    "Cash_Transactions",
    "Payments",
    "Intercompany_Loans",
    "Intercompany_Loan_Payments",
    "Account_Balances",
];

const DEFAULT_SPREADSHEET_ID: &str = "1lY1GZ_biRqCfIGKdt9lOag1isK_Wmz2ARB6GzjJ2plI";

/// Artifact entry as written in YAML: a bare file name or a table.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ArtifactEntry {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        kind: Option<ArtifactKind>,
    },
}

impl From<ArtifactEntry> for ArtifactSpec {
    fn from(entry: ArtifactEntry) -> Self {
        match entry {
            ArtifactEntry::Name(name) => ArtifactSpec::new(name),
            ArtifactEntry::Detailed { name, kind: None } => ArtifactSpec::new(name),
            ArtifactEntry::Detailed {
                name,
                kind: Some(kind),
            } => ArtifactSpec::with_kind(name, kind),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    artifacts: Option<Vec<ArtifactEntry>>,
    #[serde(default)]
    spreadsheet_id: Option<String>,
    #[serde(default)]
    expected_sheets: Option<Vec<String>>,
    #[serde(default)]
    scan_files: Option<Vec<String>>,
}

/// The static, read-only set of artifacts plus reporting inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub artifacts: Vec<ArtifactSpec>,
    pub spreadsheet_id: String,
    pub expected_sheets: Vec<String>,
    /// Files the security scanner inspects for embedded secrets.
    pub scan_files: Vec<String>,
}

impl Default for Manifest {
    fn default() -> Self {
        let artifacts: Vec<ArtifactSpec> =
            DEFAULT_ARTIFACTS.iter().map(|n| ArtifactSpec::new(*n)).collect();
        let scan_files = default_scan_files(&artifacts);
        Self {
            artifacts,
            spreadsheet_id: DEFAULT_SPREADSHEET_ID.to_string(),
            expected_sheets: DEFAULT_SHEETS.iter().map(|s| s.to_string()).collect(),
            scan_files,
        }
    }
}

impl Manifest {
    /// `<project_dir>/scriptsync.yaml`: pure, no I/O.
    pub fn path_at(project_dir: &Path) -> PathBuf {
        project_dir.join(MANIFEST_FILE)
    }

    /// Load the manifest for `project_dir`, falling back to the defaults when
    /// no manifest file exists. Omitted keys also take their defaults.
    pub fn load_at(project_dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::path_at(project_dir);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;
        Self::parse(&contents).map_err(|e| ConfigError::Manifest { path, source: e })
    }

    /// Parse manifest YAML, filling omitted keys with defaults. A document
    /// with nothing but comments and blank lines is all defaults.
    pub fn parse(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let blank = yaml
            .lines()
            .map(str::trim)
            .all(|line| line.is_empty() || line.starts_with('#'));
        if blank {
            return Ok(Self::default());
        }
        let file: ManifestFile = serde_yaml::from_str(yaml)?;
        let defaults = Self::default();

        let artifacts: Vec<ArtifactSpec> = match file.artifacts {
            Some(entries) => entries.into_iter().map(ArtifactSpec::from).collect(),
            None => defaults.artifacts,
        };
        let scan_files = file
            .scan_files
            .unwrap_or_else(|| default_scan_files(&artifacts));

        Ok(Self {
            artifacts,
            spreadsheet_id: file.spreadsheet_id.unwrap_or(defaults.spreadsheet_id),
            expected_sheets: file.expected_sheets.unwrap_or(defaults.expected_sheets),
            scan_files,
        })
    }

    /// Remote names of the server-logic artifacts, in declared order.
    pub fn expected_script_names(&self) -> Vec<&str> {
        self.artifacts
            .iter()
            .filter(|a| a.kind == ArtifactKind::ServerJs)
            .map(ArtifactSpec::remote_name)
            .collect()
    }
}

fn default_scan_files(artifacts: &[ArtifactSpec]) -> Vec<String> {
    artifacts.iter().map(|a| a.name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_shipped_project() {
        let m = Manifest::default();
        assert_eq!(m.artifacts.len(), 14);
        assert_eq!(m.artifacts[0].name, "Config.gs");
        assert_eq!(m.expected_sheets.len(), 17);
        assert!(m.expected_script_names().contains(&"OptimizedSetup"));
    }

    #[test]
    fn parse_mixed_artifact_entries_keeps_order() {
        let yaml = "artifacts:\n  - Main.gs\n  - name: Sidebar.html\n  - name: Notes.txt\n    kind: HTML\n";
        let m = Manifest::parse(yaml).expect("parse");
        let names: Vec<_> = m.artifacts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Main.gs", "Sidebar.html", "Notes.txt"]);
        assert_eq!(m.artifacts[1].kind, ArtifactKind::Html);
        assert_eq!(m.artifacts[2].kind, ArtifactKind::Html);
        assert_eq!(m.scan_files, ["Main.gs", "Sidebar.html", "Notes.txt"]);
        assert_eq!(m.expected_sheets.len(), 17, "omitted keys take defaults");
    }

    #[test]
    fn empty_document_is_all_defaults() {
        let m = Manifest::parse("{}").expect("parse");
        assert_eq!(m, Manifest::default());
    }

    #[rstest::rstest]
    #[case::empty("")]
    #[case::whitespace("  \n\t\n")]
    #[case::comments_only("# scriptsync manifest\n\n  # artifacts: []\n")]
    fn blank_manifest_is_all_defaults(#[case] yaml: &str) {
        let m = Manifest::parse(yaml).expect("blank manifest parses");
        assert_eq!(m, Manifest::default());
    }

    #[test]
    fn comment_only_manifest_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(Manifest::path_at(dir.path()), "# nothing configured yet\n").expect("write");
        assert_eq!(Manifest::load_at(dir.path()).expect("load"), Manifest::default());
    }
}
