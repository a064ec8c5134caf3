use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::config::Service;

/// File extensions the suggestion services accept
pub const SUPPORTED_FILE_TYPES: [&str; 3] = [".md", ".mdx", ".ipynb"];

/// A command addressed to a service in a PR comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Command {
    /// `/<service> <path>`: ask the service for suggestions on a file
    Review { path: String },
    /// `/<service> <path> --commit`: apply the last posted suggestions
    Commit { path: String },
}

impl Command {
    pub fn path(&self) -> &str {
        match self {
            Command::Review { path } | Command::Commit { path } => path,
        }
    }
}

/// Extensions as a regex alternation, longest first so `.mdx` never matches as `.md`
fn file_types_pattern() -> String {
    let mut types = SUPPORTED_FILE_TYPES.to_vec();
    types.sort_by_key(|t| std::cmp::Reverse(t.len()));
    types
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|")
}

fn command_pattern(service: Service) -> String {
    format!(
        r"{}\s+([\w/.\-]*[\w.\-](?:{}))\b(\s+--commit\b)?",
        regex::escape(&service.trigger()),
        file_types_pattern()
    )
}

static SMARTEDITOR_COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&command_pattern(Service::Smarteditor)).expect("valid smarteditor command regex")
});

static ACTIVATOR_COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&command_pattern(Service::Activator)).expect("valid activator command regex")
});

fn command_regex(service: Service) -> &'static Regex {
    match service {
        Service::Smarteditor => &SMARTEDITOR_COMMAND_RE,
        Service::Activator => &ACTIVATOR_COMMAND_RE,
    }
}

/// Parse the first command addressed to `service` in a comment body
pub fn parse_command(service: Service, body: &str) -> Option<Command> {
    let caps = command_regex(service).captures(body)?;
    let path = normalize_path(&caps[1]);

    if caps.get(2).is_some() {
        Some(Command::Commit { path })
    } else {
        Some(Command::Review { path })
    }
}

/// Repository-relative form of a path: `./docs/a.md` becomes `docs/a.md`
fn normalize_path(raw: &str) -> String {
    let mut path = raw;
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path.to_string()
}

/// Service whose trigger token appears first in the body, if any
pub fn detect_service(body: &str) -> Option<Service> {
    Service::ALL
        .into_iter()
        .filter_map(|service| body.find(&service.trigger()).map(|pos| (pos, service)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, service)| service)
}

/// Human readable list of supported extensions, e.g. "`.md`, `.mdx`, `.ipynb`"
pub fn supported_types_list() -> String {
    SUPPORTED_FILE_TYPES
        .iter()
        .map(|t| format!("`{t}`"))
        .collect::<Vec<_>>()
        .join(", ")
}
