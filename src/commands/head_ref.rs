use anyhow::Result;

use crate::config::GitHubArgs;
use crate::github::client::{GitHubClient, PullRequestHost};

/// Print the head branch of a pull request, for checking it out in a workflow
pub async fn run(args: &GitHubArgs, pr_number: u64) -> Result<()> {
    let client = GitHubClient::new(&args.resolve()?)?;
    let pr = client.get_pr(pr_number).await?;

    println!("{}", pr.head_ref);

    Ok(())
}
