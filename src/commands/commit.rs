use anyhow::Result;
use tracing::{error, info, instrument, warn};

use super::handle::Handler;
use super::messages;
use crate::github::client::FileUpdate;
use crate::suggestions::{Suggestion, apply, heading, inline_summary_marker, parse_block};

/// Apply the most recent block of suggestions for `path` and commit it to the head branch
#[instrument(skip(handler))]
pub async fn run(handler: &Handler<'_>, path: &str) -> Result<()> {
    let host = handler.host;
    let marker = heading(handler.service, path);

    let comments = host.list_comments(handler.pr_number).await?;
    let latest = comments
        .iter()
        .rev()
        .filter(|c| c.body.contains(&marker))
        .map(|c| (c.id, parse_block(&c.body)))
        .find(|(_, suggestions)| !suggestions.is_empty());

    let Some((comment_id, suggestions)) = latest else {
        let inline_marker = inline_summary_marker(handler.service, path);
        let message = if comments.iter().any(|c| c.body.starts_with(&inline_marker)) {
            warn!("Suggestions were only posted inline. Nothing to commit from a comment");
            messages::inline_only(handler.service, path)
        } else {
            error!("Failed to find a suggestions comment. Unable to proceed with commit");
            messages::missing_block(handler.service, path)
        };
        handler.post(&message).await?;
        return Ok(());
    };
    info!(
        "Extracted {} suggestions from comment {}",
        suggestions.len(),
        comment_id
    );

    let pr = host.get_pr(handler.pr_number).await?;
    let file = host.get_file_content(path, &pr.head_ref).await?;

    let applied = apply(&file.text, &suggestions);
    log_replacements(&suggestions, &applied.missing);
    info!("Total text replacements made in file: {}", applied.replaced);

    if applied.replaced == 0 {
        info!("No text replacements required. Skipping the commit");
        handler
            .post(&messages::nothing_applied(handler.service, path))
            .await?;
        return Ok(());
    }

    let message = format!("Apply {} suggestions to {}", handler.service.label(), path);
    let commit_sha = host
        .update_file(&FileUpdate {
            path,
            content: &applied.content,
            blob_sha: &file.sha,
            branch: &pr.head_ref,
            message: &message,
            committer: &handler.committer,
        })
        .await?;
    info!("Changes committed to {} as {}", pr.head_ref, commit_sha);

    handler
        .post(&messages::committed(
            handler.service,
            path,
            applied.replaced,
            &commit_sha,
        ))
        .await?;

    Ok(())
}

fn log_replacements(suggestions: &[Suggestion], missing: &[String]) {
    for suggestion in suggestions {
        if missing.contains(&suggestion.original) {
            warn!(
                "Original sentence not found in file: '{}'",
                suggestion.original
            );
        } else {
            info!(
                "Replaced: '{}' with '{}'",
                suggestion.original, suggestion.revised
            );
        }
    }
}
