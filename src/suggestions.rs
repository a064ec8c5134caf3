//! Rendering service suggestions as PR comments and reading them back.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::Service;
use crate::diff::types::Hunk;
use crate::service::types::Violation;

static BLOCK_ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\*\*Original:\*\*\s(.*?)\n\*\*Revised:\*\*\s(.*?)\n\*\*Explanation:\*\*")
        .expect("valid block entry regex")
});

/// An (original, revised) sentence pair recovered from a block comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub original: String,
    pub revised: String,
}

/// Outcome of applying suggestions to a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub content: String,
    /// Suggestions whose original sentence was found and replaced
    pub replaced: usize,
    /// Original sentences that no longer appear in the file
    pub missing: Vec<String>,
}

/// A line in the new file that contains a flagged sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub line: u32,
    /// The line with the sentence already rewritten
    pub rewritten: String,
}

/// Marker that identifies the block comment for a file
pub fn heading(service: Service, path: &str) -> String {
    format!("{} suggestions for `{}`", service.label(), path)
}

pub fn run_link(run_url: &str) -> String {
    format!("[Explore how the LLM generated them.]({run_url})")
}

/// One `Original / Revised / Explanation` entry per violation
pub fn format_block(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| {
            format!(
                "**Original:** {}\n**Revised:** {}\n**Explanation:** {}\n\n",
                v.original_sentence, v.revised_sentence, v.clear_explanation
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full block comment posted for files that already existed before the PR
pub fn block_comment(
    service: Service,
    path: &str,
    violations: &[Violation],
    run_url: Option<&str>,
) -> String {
    let mut comment = format!("{}:\n\n{}", heading(service, path), format_block(violations));
    if let Some(url) = run_url {
        comment.push_str(&run_link(url));
    }
    comment.push_str(&format!(
        " Use `{} {} --commit` to commit all suggestions.",
        service.trigger(),
        path
    ));
    comment
}

/// Summary comment preceding the inline suggestions on a newly added file
pub fn inline_summary_comment(service: Service, path: &str, run_url: Option<&str>) -> String {
    let mut comment = inline_summary_marker(service, path);
    if let Some(url) = run_url {
        comment.push(' ');
        comment.push_str(&run_link(url));
    }
    comment
}

/// Opening line of the comment announcing inline suggestions for a file
pub fn inline_summary_marker(service: Service, path: &str) -> String {
    format!("{} posted below.", heading(service, path))
}

/// Body of an inline review comment carrying a GitHub suggestion block
pub fn review_comment_body(rewritten_line: &str, violation: &Violation) -> String {
    format!(
        "**Suggested Change:**\n```suggestion\n{}\n```\n**Explanation:** {}",
        rewritten_line, violation.clear_explanation
    )
}

/// Recover suggestions from a block comment produced by [`block_comment`]
pub fn parse_block(body: &str) -> Vec<Suggestion> {
    BLOCK_ENTRY_RE
        .captures_iter(body)
        .map(|caps| Suggestion {
            original: caps[1].to_string(),
            revised: caps[2].to_string(),
        })
        .collect()
}

/// Replace every occurrence of each original sentence, in order
pub fn apply(content: &str, suggestions: &[Suggestion]) -> Applied {
    let mut content = content.to_string();
    let mut replaced = 0;
    let mut missing = Vec::new();

    for suggestion in suggestions {
        if !suggestion.original.is_empty() && content.contains(&suggestion.original) {
            content = content.replace(&suggestion.original, &suggestion.revised);
            replaced += 1;
        } else {
            missing.push(suggestion.original.clone());
        }
    }

    Applied {
        content,
        replaced,
        missing,
    }
}

/// Lines of the new file, visible in the diff, that contain the flagged sentence
pub fn find_targets(hunks: &[Hunk], violation: &Violation) -> Vec<Target> {
    let original = violation.original_sentence.as_str();
    if original.is_empty() {
        return Vec::new();
    }

    hunks
        .iter()
        .flat_map(|hunk| hunk.right_side_lines())
        .filter(|line| line.content.contains(original))
        .filter_map(|line| {
            line.new_line.map(|number| Target {
                line: number,
                rewritten: line.content.replace(original, &violation.revised_sentence),
            })
        })
        .collect()
}
