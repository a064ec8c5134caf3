use clap::{Args, ValueEnum};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::command::detect_service;
use crate::github::auth::get_token;
use crate::github::types::RepoRef;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// The remote suggestion service a comment is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Service {
    Smarteditor,
    Activator,
}

impl Service {
    pub const ALL: [Service; 2] = [Service::Smarteditor, Service::Activator];

    /// Lowercase name, as used in the trigger token
    pub fn name(self) -> &'static str {
        match self {
            Service::Smarteditor => "smarteditor",
            Service::Activator => "activator",
        }
    }

    /// Comment token that addresses this service, e.g. `/smarteditor`
    pub fn trigger(self) -> String {
        format!("/{}", self.name())
    }

    /// Uppercase name, used for secret names and comment headings
    pub fn label(self) -> String {
        self.name().to_uppercase()
    }

    pub fn endpoint_var(self) -> String {
        format!("{}_ENDPOINT", self.label())
    }

    pub fn token_var(self) -> String {
        format!("{}_TOKEN", self.label())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid repository slug `{0}`, expected `owner/repo`")]
    InvalidRepository(String),
    #[error("Missing service endpoint: pass --endpoint or set {0}")]
    MissingEndpoint(String),
    #[error("Invalid URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("No GitHub token found: {0}")]
    MissingGitHubToken(String),
}

/// Options shared by every subcommand that talks to GitHub
#[derive(Debug, Clone, Args)]
pub struct GitHubArgs {
    /// Repository slug (owner/repo)
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: String,

    /// GitHub token; falls back to `gh auth token`
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Base URL of the GitHub REST API
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_GITHUB_API_URL)]
    pub github_api_url: String,
}

/// Options of the `handle` subcommand
#[derive(Debug, Clone, Args)]
pub struct HandleArgs {
    #[command(flatten)]
    pub github: GitHubArgs,

    /// Pull request number
    #[arg(long, env = "PR_NUMBER")]
    pub pr_number: u64,

    /// Id of the triggering comment
    #[arg(long, env = "COMMENT_ID")]
    pub comment_id: Option<u64>,

    /// Body of the triggering comment
    #[arg(long, env = "COMMENT_BODY", default_value = "")]
    pub comment_body: String,

    /// Service the comment is addressed to; detected from the comment body when unset
    #[arg(long, env = "SERVICE", value_enum)]
    pub service: Option<Service>,

    /// Service endpoint; defaults to `<SERVICE>_ENDPOINT`
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Service token; defaults to `<SERVICE>_TOKEN`
    #[arg(long)]
    pub service_token: Option<String>,

    /// Seconds to wait for the service to answer
    #[arg(long, env = "SERVICE_TIMEOUT_SECS", default_value_t = 120)]
    pub timeout_secs: u64,

    /// Committer name used by `--commit`
    #[arg(long, env = "COMMIT_USERNAME", default_value = "github-actions")]
    pub commit_username: String,

    /// Committer email used by `--commit`
    #[arg(long, env = "COMMIT_EMAIL", default_value = "github-actions@github.com")]
    pub commit_email: String,
}

/// Resolved GitHub connection settings
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub repo: RepoRef,
    pub token: String,
    pub api_url: Url,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub service: Service,
    pub endpoint: Url,
    pub token: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committer {
    pub name: String,
    pub email: String,
}

/// Everything a `handle` run needs
#[derive(Debug, Clone)]
pub struct Config {
    pub github: GitHubConfig,
    pub service: ServiceConfig,
    pub pr_number: u64,
    pub comment_id: Option<u64>,
    pub comment_body: String,
    pub committer: Committer,
}

impl GitHubArgs {
    pub fn resolve(&self) -> Result<GitHubConfig, ConfigError> {
        let repo = RepoRef::parse(&self.repository)?;
        let api_url = parse_url(&self.github_api_url)?;
        let token = match &self.github_token {
            Some(token) if !token.is_empty() => token.clone(),
            _ => get_token().map_err(|e| ConfigError::MissingGitHubToken(e.to_string()))?,
        };

        Ok(GitHubConfig {
            repo,
            token,
            api_url,
        })
    }
}

impl HandleArgs {
    /// Resolve against the process environment
    pub fn resolve(&self) -> Result<Config, ConfigError> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve with a custom lookup for the per-service secrets
    pub fn resolve_with<F>(&self, lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let github = self.github.resolve()?;
        let service = self.resolve_service(&lookup)?;

        Ok(Config {
            github,
            service,
            pr_number: self.pr_number,
            comment_id: self.comment_id,
            comment_body: self.comment_body.clone(),
            committer: Committer {
                name: self.commit_username.clone(),
                email: self.commit_email.clone(),
            },
        })
    }

    /// Explicit choice, else the service named in the comment, else smarteditor
    pub fn selected_service(&self) -> Service {
        self.service
            .or_else(|| detect_service(&self.comment_body))
            .unwrap_or(Service::Smarteditor)
    }

    fn resolve_service<F>(&self, lookup: &F) -> Result<ServiceConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let service = self.selected_service();
        let endpoint_var = service.endpoint_var();
        let endpoint = self
            .endpoint
            .clone()
            .or_else(|| lookup(&endpoint_var))
            .filter(|e| !e.trim().is_empty())
            .ok_or(ConfigError::MissingEndpoint(endpoint_var))?;

        let token = self
            .service_token
            .clone()
            .or_else(|| lookup(&service.token_var()))
            .filter(|t| !t.is_empty());

        Ok(ServiceConfig {
            service,
            endpoint: parse_url(endpoint.trim())?,
            token,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}
