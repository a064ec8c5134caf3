use anyhow::Result;
use tracing::{debug, error, info, warn};

use super::{commit, messages, review};
use crate::command::{Command, parse_command};
use crate::config::{Committer, HandleArgs, Service};
use crate::github::client::{GitHubClient, PullRequestHost};
use crate::github::types::Reaction;
use crate::service::client::{HttpSuggestionService, SuggestionService};

/// Everything needed to act on one trigger comment
pub struct Handler<'a> {
    pub host: &'a dyn PullRequestHost,
    pub suggester: &'a dyn SuggestionService,
    pub service: Service,
    pub pr_number: u64,
    pub committer: Committer,
}

pub async fn run(args: &HandleArgs) -> Result<()> {
    let config = args.resolve()?;
    let host = GitHubClient::new(&config.github)?;
    let suggester = HttpSuggestionService::new(&config.service)?;

    info!(
        pr = %config.github.repo.pr_url(config.pr_number),
        service = config.service.service.name(),
        "Handling comment"
    );

    let handler = Handler {
        host: &host,
        suggester: &suggester,
        service: config.service.service,
        pr_number: config.pr_number,
        committer: config.committer,
    };

    handler
        .handle(config.comment_id, &config.comment_body)
        .await
}

impl Handler<'_> {
    pub async fn handle(&self, comment_id: Option<u64>, body: &str) -> Result<()> {
        if let Some(id) = comment_id {
            if let Err(e) = self.host.add_reaction(id, Reaction::Eyes).await {
                warn!("Failed to add reaction to comment {}: {:#}", id, e);
            }
        }

        debug!("Received comment body (raw): {:?}", body);

        let Some(command) = parse_command(self.service, body) else {
            info!("No valid command found in the comment.");
            self.post(&messages::no_command()).await?;
            return Ok(());
        };

        let path = command.path();
        let outcome = match &command {
            Command::Review { path } => {
                info!("[{}] File path identified", path);
                review::run(self, path).await
            }
            Command::Commit { path } => {
                info!("[{}] Commit command identified", path);
                commit::run(self, path).await
            }
        };

        if let Err(e) = outcome {
            error!("[{}] Error processing file: {:#}", path, e);
            if let Err(post_err) = self.post(&messages::processing_error(path)).await {
                warn!("[{}] Failed to report error on the PR: {:#}", path, post_err);
            }
            return Err(e);
        }

        Ok(())
    }

    /// Post to the PR conversation
    pub(crate) async fn post(&self, body: &str) -> Result<u64> {
        self.host.post_comment(self.pr_number, body).await
    }
}
