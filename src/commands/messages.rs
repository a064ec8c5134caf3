//! Comment bodies posted back to the pull request conversation.

use crate::command::supported_types_list;
use crate::config::Service;
use crate::suggestions::heading;

pub fn no_command() -> String {
    format!(
        "No valid command found in the comment. Supported file types are: {}",
        supported_types_list()
    )
}

pub fn service_failure(service: Service, path: &str) -> String {
    format!(
        "Failed to get a response from the {} for file `{}`. Please check the logs for more details.",
        service.endpoint_var(),
        path
    )
}

pub fn no_violations(path: &str) -> String {
    format!(
        "There appear to be no instances of sentences that violate the style guide rules in `{path}`."
    )
}

pub fn deleted_file(path: &str) -> String {
    format!("`{path}` is deleted in this pull request, so there is nothing to review.")
}

pub fn processing_error(path: &str) -> String {
    format!("Error processing file `{path}`. Please check the logs for more details.")
}

pub fn missing_block(service: Service, path: &str) -> String {
    format!(
        "Could not find a comment with {} to commit. Run `{} {}` first.",
        heading(service, path),
        service.trigger(),
        path
    )
}

pub fn inline_only(service: Service, path: &str) -> String {
    format!(
        "The {} suggestions for `{}` were posted as inline review comments. Commit them from the pull request's Files changed tab.",
        service.label(),
        path
    )
}

pub fn nothing_applied(service: Service, path: &str) -> String {
    format!(
        "None of the {} suggestions could be applied to `{}`. The file may already contain them.",
        service.label(),
        path
    )
}

pub fn committed(service: Service, path: &str, replaced: usize, commit_sha: &str) -> String {
    let noun = if replaced == 1 {
        "suggestion"
    } else {
        "suggestions"
    };
    format!(
        "Committed {} {} {} to `{}` in {}.",
        replaced,
        service.label(),
        noun,
        path,
        commit_sha
    )
}
