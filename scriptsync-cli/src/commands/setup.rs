//! `scriptsync setup`: interactive first-time configuration.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::{Confirm, Input, Password};

use scriptsync_core::{
    config::{is_placeholder, keys, DEFAULT_BRANCH, DEFAULT_REDIRECT_URI, ENV_FILE, TOKEN_FILE},
    credential_store::restrict_to_owner,
    manifest::MANIFEST_FILE,
};

/// Values written to `.env`; blanks become placeholders.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct EnvValues {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    script_id: String,
    repo_url: String,
    branch: String,
}

pub fn run() -> Result<()> {
    let dir = super::project_dir()?;
    println!("{}\n", "🛠  scriptsync setup".bold());

    print_state(&dir);

    let env_path = dir.join(ENV_FILE);
    let write_env = !env_path.exists()
        || Confirm::new()
            .with_prompt(".env already exists. Overwrite it?")
            .default(false)
            .interact()
            .context("failed to read answer")?;

    if write_env {
        let values = ask_values()?;
        std::fs::write(&env_path, render_env(&values))
            .with_context(|| format!("failed to write {}", env_path.display()))?;
        if let Err(err) = restrict_to_owner(&env_path) {
            tracing::warn!(path = %env_path.display(), error = %err, "could not restrict .env permissions");
        }
        println!("\n{} {}\n", "✅ Wrote".green(), env_path.display());
    } else {
        println!("Keeping the existing .env\n");
    }

    let run_check = Confirm::new()
        .with_prompt("Run the security check now?")
        .default(true)
        .interact()
        .context("failed to read answer")?;
    if run_check {
        let manifest = super::load_manifest(&dir)?;
        if !super::security_check::audit_and_print(&dir, &manifest.scan_files) {
            println!("\n{}", "⚠️  Fix the reported issues before continuing.".yellow());
        }
    }

    print_next_steps(&dir);
    Ok(())
}

fn print_state(dir: &Path) {
    println!("Current state:");
    for name in [ENV_FILE, "credentials.json", TOKEN_FILE, MANIFEST_FILE] {
        let mark = if dir.join(name).exists() { "✅".green() } else { "❌".red() };
        println!("  {name}: {mark}");
    }
    println!();
}

fn ask_values() -> Result<EnvValues> {
    println!("Enter the values (leave blank to fill in later):\n");
    let text = |key: &str, default: Option<&str>| -> Result<String> {
        let mut input = Input::<String>::new().with_prompt(key).allow_empty(true);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        input
            .interact_text()
            .with_context(|| format!("failed to read {key}"))
    };

    let client_id = text(keys::CLIENT_ID, None)?;
    let client_secret = Password::new()
        .with_prompt(keys::CLIENT_SECRET)
        .allow_empty_password(true)
        .interact()
        .context("failed to read client secret")?;
    let redirect_uri = text(keys::REDIRECT_URI, Some(DEFAULT_REDIRECT_URI))?;
    let script_id = text(keys::SCRIPT_ID, None)?;
    let repo_url = text(keys::REPO_URL, None)?;
    let branch = text(keys::BRANCH, Some(DEFAULT_BRANCH))?;

    Ok(EnvValues {
        client_id,
        client_secret,
        redirect_uri,
        script_id,
        repo_url,
        branch,
    })
}

fn render_env(values: &EnvValues) -> String {
    let or = |value: &str, fallback: &str| {
        let value = value.trim();
        if value.is_empty() {
            fallback.to_string()
        } else {
            value.to_string()
        }
    };
    format!(
        "# Google OAuth client\n\
         {}={}\n\
         {}={}\n\
         {}={}\n\
         \n\
         # Apps Script project ID\n\
         {}={}\n\
         \n\
         # Source repository\n\
         {}={}\n\
         {}={}\n",
        keys::CLIENT_ID,
        or(&values.client_id, "your_client_id_here"),
        keys::CLIENT_SECRET,
        or(&values.client_secret, "your_client_secret_here"),
        keys::REDIRECT_URI,
        or(&values.redirect_uri, DEFAULT_REDIRECT_URI),
        keys::SCRIPT_ID,
        or(&values.script_id, "your_script_id_here"),
        keys::REPO_URL,
        or(&values.repo_url, "https://github.com/your-username/your-repo"),
        keys::BRANCH,
        or(&values.branch, DEFAULT_BRANCH),
    )
}

fn print_next_steps(dir: &Path) {
    let env = std::fs::read_to_string(dir.join(ENV_FILE)).unwrap_or_default();
    let unset = |key: &str| {
        env.lines()
            .filter_map(|l| l.split_once('='))
            .find(|(k, _)| k.trim() == key)
            .map_or(true, |(_, v)| is_placeholder(v))
    };

    println!("\n{}", super::rule("="));
    println!("📋 NEXT STEPS:");
    println!("{}\n", super::rule("="));
    let mut step = 1;
    if unset(keys::CLIENT_ID) || unset(keys::CLIENT_SECRET) {
        println!("{step}. Set up Google Cloud:");
        println!("   - enable the Apps Script API");
        println!("   - create an OAuth client ID (Desktop app)");
        println!("   - put its ID and secret into .env\n");
        step += 1;
    }
    if unset(keys::SCRIPT_ID) {
        println!("{step}. Set GOOGLE_SCRIPT_ID (Apps Script → Project Settings → Script ID)\n");
        step += 1;
    }
    println!("{step}. Push the scripts:\n   scriptsync update\n");
    step += 1;
    println!("{step}. In Apps Script run updateSystem() to refresh the sheet structure\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_render_as_placeholders() {
        let rendered = render_env(&EnvValues::default());
        assert!(rendered.contains("GOOGLE_CLIENT_ID=your_client_id_here\n"));
        assert!(rendered.contains("GOOGLE_SCRIPT_ID=your_script_id_here\n"));
        assert!(rendered.contains("GITHUB_BRANCH=main\n"));
        assert!(rendered.contains(&format!("GOOGLE_REDIRECT_URI={DEFAULT_REDIRECT_URI}\n")));
    }

    #[test]
    fn provided_values_are_trimmed() {
        let values = EnvValues {
            client_id: " 123.apps.googleusercontent.com ".into(),
            script_id: "abc".into(),
            ..EnvValues::default()
        };
        let rendered = render_env(&values);
        assert!(rendered.contains("GOOGLE_CLIENT_ID=123.apps.googleusercontent.com\n"));
        assert!(rendered.contains("GOOGLE_SCRIPT_ID=abc\n"));
    }

    #[test]
    fn rendered_file_loads_back_as_placeholder_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(ENV_FILE), render_env(&EnvValues::default())).expect("write");
        let config = scriptsync_core::Config::from_lookup(dir.path(), |key| {
            let env = std::fs::read_to_string(dir.path().join(ENV_FILE)).ok()?;
            env.lines()
                .filter_map(|l| l.split_once('='))
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .expect("config");
        assert!(config.validate().is_err());
        assert!(config.remote_source().is_none());
    }
}
