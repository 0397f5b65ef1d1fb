//! Terminal consent prompt.

use colored::Colorize;
use dialoguer::Input;

use scriptsync_sync::{AuthError, CodePrompt};

/// Prints the authorization URL and reads the code from the terminal.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl CodePrompt for StdinPrompt {
    fn prompt_for_authorization_code(&self, auth_url: &str) -> Result<String, AuthError> {
        println!("\n{}", "🔐 Authorization required!".bold());
        println!("Visit this URL to authorize:\n  {}", auth_url.cyan());
        println!("{}\n", "⚠️  Keep this code private and do not share it!".yellow());

        Input::<String>::new()
            .with_prompt("Enter the code from that page here")
            .interact_text()
            .map_err(|e| AuthError::Prompt(e.to_string()))
    }
}
