use anyhow::Result;
use tracing::{error, info, instrument, warn};

use super::handle::Handler;
use super::messages;
use crate::github::types::{ChangedFile, FileStatus, PullRequest};
use crate::service::types::Violation;
use crate::suggestions::{
    block_comment, find_targets, inline_summary_comment, review_comment_body,
};

/// Send a file to the service and post what comes back
#[instrument(skip(handler))]
pub async fn run(handler: &Handler<'_>, path: &str) -> Result<()> {
    info!("Starting review");
    let host = handler.host;

    let (pr, files) = tokio::try_join!(
        host.get_pr(handler.pr_number),
        host.get_pr_files(handler.pr_number)
    )?;
    let changed = files.into_iter().find(|f| f.path == path);

    let status = changed.as_ref().map(|f| f.status);
    if status == Some(FileStatus::Deleted) {
        info!("File is deleted in this pull request");
        handler.post(&messages::deleted_file(path)).await?;
        return Ok(());
    }

    let content = host.get_file_content(path, &pr.head_sha).await?;

    let response = match handler.suggester.review(path, &content.text).await {
        Ok(response) => response,
        Err(e) => {
            error!("Failed to get a response from {}: {}", handler.service.endpoint_var(), e);
            handler
                .post(&messages::service_failure(handler.service, path))
                .await?;
            return Ok(());
        }
    };

    if response.violations.is_empty() {
        info!("No sentences violating the style guide found");
        handler.post(&messages::no_violations(path)).await?;
        return Ok(());
    }

    let run_url = response.run_url.as_deref();
    match changed {
        Some(file) if file.status == FileStatus::Added => {
            post_inline(handler, &pr, &file, &response.violations, run_url).await
        }
        _ => {
            handler
                .post(&block_comment(
                    handler.service,
                    path,
                    &response.violations,
                    run_url,
                ))
                .await?;
            info!(
                "Posted block comment with {} suggestions",
                response.violations.len()
            );
            Ok(())
        }
    }
}

/// One suggestion comment per diff line containing a flagged sentence.
///
/// Violations that cannot be anchored to the diff are gathered into a block
/// comment so they stay available to `--commit`.
async fn post_inline(
    handler: &Handler<'_>,
    pr: &PullRequest,
    file: &ChangedFile,
    violations: &[Violation],
    run_url: Option<&str>,
) -> Result<()> {
    handler
        .post(&inline_summary_comment(handler.service, &file.path, run_url))
        .await?;

    let mut posted = 0;
    let mut unplaced = Vec::new();

    for violation in violations {
        let mut placed = false;

        for target in find_targets(&file.hunks, violation) {
            let body = review_comment_body(&target.rewritten, violation);
            match handler
                .host
                .add_review_comment(pr.number, &pr.head_sha, &file.path, target.line, &body)
                .await
            {
                Ok(_) => {
                    info!("Posted a review comment on line {}", target.line);
                    posted += 1;
                    placed = true;
                }
                Err(e) => warn!("Failed to post review comment on line {}: {:#}", target.line, e),
            }
        }

        if !placed {
            warn!(
                "Sentence not found in the diff: '{}'",
                violation.original_sentence
            );
            unplaced.push(violation.clone());
        }
    }

    if !unplaced.is_empty() {
        handler
            .post(&block_comment(handler.service, &file.path, &unplaced, None))
            .await?;
    }

    info!(
        "Posted {} review comments, {} suggestions without a diff line",
        posted,
        unplaced.len()
    );
    Ok(())
}
