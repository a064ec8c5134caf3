use anyhow::{Result, anyhow};
use std::process::Command;

/// Token from the GitHub CLI, for runs outside of GitHub Actions
#[allow(clippy::collapsible_if)]
pub fn get_token() -> Result<String> {
    if let Ok(output) = Command::new("gh").args(["auth", "token"]).output() {
        if output.status.success() {
            let token = String::from_utf8(output.stdout)?.trim().to_string();
            if !token.is_empty() {
                return Ok(token);
            }
        }
    }

    Err(anyhow!(
        "Either set the GITHUB_TOKEN environment variable or run `gh auth login`."
    ))
}
