//! In-memory stand-ins for GitHub and the suggestion service.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::config::{Committer, Service};
use crate::diff::parser::parse_patch;
use crate::github::client::{FileUpdate, PullRequestHost};
use crate::github::types::{
    ChangedFile, FileContent, FileStatus, IssueComment, PullRequest, Reaction,
};
use crate::service::client::{ServiceError, SuggestionService};
use crate::service::types::{ServiceResponse, Violation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedReview {
    pub path: String,
    pub line: u32,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedFile {
    pub path: String,
    pub content: String,
    pub blob_sha: String,
    pub branch: String,
    pub message: String,
    pub committer: Committer,
}

#[derive(Default)]
pub struct FakeHost {
    pub files: Vec<ChangedFile>,
    pub contents: HashMap<String, FileContent>,
    pub existing_comments: Vec<IssueComment>,
    pub fail_reactions: bool,
    /// Lines on which review comments are rejected
    pub rejected_lines: Vec<u32>,
    pub reactions: Mutex<Vec<(u64, Reaction)>>,
    pub comments: Mutex<Vec<String>>,
    pub reviews: Mutex<Vec<PostedReview>>,
    pub updates: Mutex<Vec<CommittedFile>>,
}

impl FakeHost {
    pub fn with_file(mut self, path: &str, status: FileStatus, patch: &str, text: &str) -> Self {
        self.files.push(ChangedFile {
            path: path.to_string(),
            status,
            hunks: parse_patch(patch),
        });
        self.with_content(path, text)
    }

    pub fn with_content(mut self, path: &str, text: &str) -> Self {
        self.contents.insert(
            path.to_string(),
            FileContent {
                text: text.to_string(),
                sha: format!("blob-{path}"),
            },
        );
        self
    }

    pub fn with_comment(mut self, body: &str) -> Self {
        let id = self.existing_comments.len() as u64 + 1;
        self.existing_comments.push(IssueComment {
            id,
            body: body.to_string(),
        });
        self
    }

    pub fn posted_comments(&self) -> Vec<String> {
        self.comments.lock().unwrap().clone()
    }

    pub fn posted_reviews(&self) -> Vec<PostedReview> {
        self.reviews.lock().unwrap().clone()
    }

    pub fn committed(&self) -> Vec<CommittedFile> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl PullRequestHost for FakeHost {
    async fn add_reaction(&self, comment_id: u64, reaction: Reaction) -> Result<()> {
        if self.fail_reactions {
            return Err(anyhow!("Failed to add reaction: 403 Forbidden"));
        }
        self.reactions.lock().unwrap().push((comment_id, reaction));
        Ok(())
    }

    async fn get_pr(&self, number: u64) -> Result<PullRequest> {
        Ok(PullRequest {
            number,
            head_sha: "head-sha".to_string(),
            head_ref: "feature/docs".to_string(),
        })
    }

    async fn get_pr_files(&self, _number: u64) -> Result<Vec<ChangedFile>> {
        Ok(self.files.clone())
    }

    async fn get_file_content(&self, path: &str, _git_ref: &str) -> Result<FileContent> {
        self.contents
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("File not found: {}", path))
    }

    async fn post_comment(&self, _number: u64, body: &str) -> Result<u64> {
        let mut comments = self.comments.lock().unwrap();
        comments.push(body.to_string());
        Ok(100 + comments.len() as u64)
    }

    async fn list_comments(&self, _number: u64) -> Result<Vec<IssueComment>> {
        Ok(self.existing_comments.clone())
    }

    async fn add_review_comment(
        &self,
        _number: u64,
        _head_sha: &str,
        path: &str,
        line: u32,
        body: &str,
    ) -> Result<u64> {
        if self.rejected_lines.contains(&line) {
            return Err(anyhow!("Failed to create review comment: 422"));
        }
        let mut reviews = self.reviews.lock().unwrap();
        reviews.push(PostedReview {
            path: path.to_string(),
            line,
            body: body.to_string(),
        });
        Ok(200 + reviews.len() as u64)
    }

    async fn update_file(&self, update: &FileUpdate<'_>) -> Result<String> {
        self.updates.lock().unwrap().push(CommittedFile {
            path: update.path.to_string(),
            content: update.content.to_string(),
            blob_sha: update.blob_sha.to_string(),
            branch: update.branch.to_string(),
            message: update.message.to_string(),
            committer: update.committer.clone(),
        });
        Ok("commit-sha".to_string())
    }
}

pub struct FakeService {
    pub response: Option<ServiceResponse>,
    pub requests: Mutex<Vec<(String, String)>>,
}

impl FakeService {
    pub fn returning(violations: Vec<Violation>, run_url: Option<&str>) -> Self {
        Self {
            response: Some(ServiceResponse {
                violations,
                run_url: run_url.map(str::to_string),
            }),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn received(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SuggestionService for FakeService {
    async fn review(&self, path: &str, text: &str) -> Result<ServiceResponse, ServiceError> {
        self.requests
            .lock()
            .unwrap()
            .push((path.to_string(), text.to_string()));

        self.response.clone().ok_or(ServiceError::Status {
            service: Service::Smarteditor.label(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".to_string(),
        })
    }
}

pub fn violation(original: &str, revised: &str) -> Violation {
    Violation {
        original_sentence: original.to_string(),
        revised_sentence: revised.to_string(),
        clear_explanation: "Use active voice.".to_string(),
    }
}

pub fn committer() -> Committer {
    Committer {
        name: "github-actions".to_string(),
        email: "github-actions@github.com".to_string(),
    }
}
