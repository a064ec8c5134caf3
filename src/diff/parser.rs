use super::types::{DiffLine, Hunk};
use regex::Regex;
use std::sync::LazyLock;

static HUNK_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@\s*-\d+(?:,\d+)?\s*\+(\d+)(?:,\d+)?\s*@@").expect("valid hunk header regex")
});

/// Parse a unified diff patch, as returned by the pull request files API, into hunks
pub fn parse_patch(patch: &str) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    let lines: Vec<&str> = patch.lines().collect();
    let mut i = 0;

    while i < lines.len() {
        let Some(caps) = HUNK_HEADER_RE.captures(lines[i]) else {
            i += 1;
            continue;
        };

        let mut new_line: u32 = caps[1].parse().unwrap_or(0);
        i += 1;

        let mut body = Vec::new();

        while i < lines.len() {
            let content_line = lines[i];

            if content_line.starts_with("@@") || content_line.starts_with("diff ") {
                break;
            }

            let line = if let Some(text) = content_line.strip_prefix('+') {
                new_line += 1;
                DiffLine {
                    content: text.to_string(),
                    new_line: Some(new_line - 1),
                }
            } else if let Some(text) = content_line.strip_prefix('-') {
                DiffLine {
                    content: text.to_string(),
                    new_line: None,
                }
            } else if content_line.starts_with('\\') {
                // "\ No newline at end of file"
                i += 1;
                continue;
            } else {
                let text = content_line.strip_prefix(' ').unwrap_or(content_line);
                new_line += 1;
                DiffLine {
                    content: text.to_string(),
                    new_line: Some(new_line - 1),
                }
            };

            body.push(line);
            i += 1;
        }

        if !body.is_empty() {
            hunks.push(Hunk { lines: body });
        }
    }

    hunks
}
