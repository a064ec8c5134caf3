use anyhow::Result;

use crate::config::GitHubArgs;
use crate::github::client::{GitHubClient, PullRequestHost};
use crate::github::types::Reaction;

pub async fn run(args: &GitHubArgs, comment_id: u64, reaction: Reaction) -> Result<()> {
    let client = GitHubClient::new(&args.resolve()?)?;

    client.add_reaction(comment_id, reaction).await?;

    println!(
        "{}",
        serde_json::json!({
            "success": true,
            "comment_id": comment_id,
            "reaction": reaction.as_str(),
        })
    );

    Ok(())
}
