use anyhow::{Result, anyhow};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use octocrab::Octocrab;
use reqwest::Method;
use tracing::{debug, instrument};

use super::types::{
    ChangedFile, FileContent, FileStatus, IssueComment, PullRequest, Reaction, RepoRef,
};
use crate::config::{Committer, GitHubConfig};
use crate::diff::parser::parse_patch;

const USER_AGENT: &str = concat!("smarteditor-action/", env!("CARGO_PKG_VERSION"));

/// A file rewrite committed through the contents API
#[derive(Debug, Clone)]
pub struct FileUpdate<'a> {
    pub path: &'a str,
    pub content: &'a str,
    /// Blob sha of the version being replaced
    pub blob_sha: &'a str,
    pub branch: &'a str,
    pub message: &'a str,
    pub committer: &'a Committer,
}

/// The pull request operations a comment command needs
#[async_trait]
pub trait PullRequestHost: Send + Sync {
    /// React to an issue comment
    async fn add_reaction(&self, comment_id: u64, reaction: Reaction) -> Result<()>;

    /// Fetch PR metadata
    async fn get_pr(&self, number: u64) -> Result<PullRequest>;

    /// Fetch files changed in the PR with their parsed patches
    async fn get_pr_files(&self, number: u64) -> Result<Vec<ChangedFile>>;

    /// Fetch file content at a specific ref
    async fn get_file_content(&self, path: &str, git_ref: &str) -> Result<FileContent>;

    /// Post a comment on the PR conversation, returning its id
    async fn post_comment(&self, number: u64, body: &str) -> Result<u64>;

    /// All conversation comments, oldest first
    async fn list_comments(&self, number: u64) -> Result<Vec<IssueComment>>;

    /// Add an inline review comment on the right side of the diff, returning its id
    async fn add_review_comment(
        &self,
        number: u64,
        head_sha: &str,
        path: &str,
        line: u32,
        body: &str,
    ) -> Result<u64>;

    /// Commit a new version of a file, returning the commit sha
    async fn update_file(&self, update: &FileUpdate<'_>) -> Result<String>;
}

/// GitHub API client wrapper
pub struct GitHubClient {
    octocrab: Octocrab,
    http: reqwest::Client,
    token: String,
    repo: RepoRef,
    api_base: String,
}

impl GitHubClient {
    /// Create a new authenticated GitHub client for one repository
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        // octocrab's rustls stack needs a process-wide crypto provider; installing twice returns Err
        let _ = rustls::crypto::ring::default_provider().install_default();

        let api_base = config.api_url.as_str().trim_end_matches('/').to_string();
        let octocrab = Octocrab::builder()
            .personal_token(config.token.clone())
            .base_uri(api_base.as_str())?
            .build()?;
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            octocrab,
            http,
            token: config.token.clone(),
            repo: config.repo.clone(),
            api_base,
        })
    }

    fn repo_url(&self, rest: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.repo.owner, self.repo.repo, rest
        )
    }

    /// Raw API request carrying the headers GitHub expects
    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        request: reqwest::RequestBuilder,
        action: &str,
    ) -> Result<T> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Failed to {}: {} - {}", action, status, error_body));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl PullRequestHost for GitHubClient {
    #[instrument(skip(self))]
    async fn add_reaction(&self, comment_id: u64, reaction: Reaction) -> Result<()> {
        let url = self.repo_url(&format!("issues/comments/{comment_id}/reactions"));

        let _: serde_json::Value = Self::send_json(
            self.request(Method::POST, &url)
                .json(&serde_json::json!({ "content": reaction.as_str() })),
            "add reaction",
        )
        .await?;

        Ok(())
    }

    async fn get_pr(&self, number: u64) -> Result<PullRequest> {
        let pr = self
            .octocrab
            .pulls(&self.repo.owner, &self.repo.repo)
            .get(number)
            .await?;

        Ok(PullRequest {
            number: pr.number,
            head_sha: pr.head.sha,
            head_ref: pr.head.ref_field,
        })
    }

    async fn get_pr_files(&self, number: u64) -> Result<Vec<ChangedFile>> {
        let first_page = self
            .octocrab
            .pulls(&self.repo.owner, &self.repo.repo)
            .list_files(number)
            .await?;
        let files = self.octocrab.all_pages(first_page).await?;

        let changed = files
            .into_iter()
            .map(|file| {
                // Convert DiffEntryStatus to string via Debug format
                let status_str = format!("{:?}", file.status).to_lowercase();
                let hunks = file.patch.as_deref().map(parse_patch).unwrap_or_default();

                ChangedFile {
                    path: file.filename,
                    status: FileStatus::from(status_str.as_str()),
                    hunks,
                }
            })
            .collect::<Vec<_>>();

        debug!(files = changed.len(), "Fetched changed files");
        Ok(changed)
    }

    async fn get_file_content(&self, path: &str, git_ref: &str) -> Result<FileContent> {
        let content = self
            .octocrab
            .repos(&self.repo.owner, &self.repo.repo)
            .get_content()
            .path(path)
            .r#ref(git_ref)
            .send()
            .await?;

        let item = content
            .items
            .first()
            .ok_or_else(|| anyhow!("File not found: {}", path))?;
        let encoded = item
            .content
            .as_deref()
            .ok_or_else(|| anyhow!("File content is empty: {}", path))?;

        Ok(FileContent {
            text: decode_content(encoded)?,
            sha: item.sha.clone(),
        })
    }

    async fn post_comment(&self, number: u64, body: &str) -> Result<u64> {
        let comment = self
            .octocrab
            .issues(&self.repo.owner, &self.repo.repo)
            .create_comment(number, body)
            .await?;

        Ok(comment.id.0)
    }

    async fn list_comments(&self, number: u64) -> Result<Vec<IssueComment>> {
        let first_page = self
            .octocrab
            .issues(&self.repo.owner, &self.repo.repo)
            .list_comments(number)
            .per_page(100)
            .send()
            .await?;
        let comments = self.octocrab.all_pages(first_page).await?;

        Ok(comments
            .into_iter()
            .map(|c| IssueComment {
                id: c.id.0,
                body: c.body.unwrap_or_default(),
            })
            .collect())
    }

    #[instrument(skip(self, head_sha, body))]
    async fn add_review_comment(
        &self,
        number: u64,
        head_sha: &str,
        path: &str,
        line: u32,
        body: &str,
    ) -> Result<u64> {
        #[derive(serde::Serialize)]
        struct CommentRequest<'a> {
            body: &'a str,
            commit_id: &'a str,
            path: &'a str,
            line: u32,
            side: &'a str,
        }

        #[derive(serde::Deserialize)]
        struct CommentResponseRaw {
            id: u64,
        }

        let url = self.repo_url(&format!("pulls/{number}/comments"));
        let raw: CommentResponseRaw = Self::send_json(
            self.request(Method::POST, &url).json(&CommentRequest {
                body,
                commit_id: head_sha,
                path,
                line,
                side: "RIGHT",
            }),
            "create review comment",
        )
        .await?;

        Ok(raw.id)
    }

    #[instrument(skip(self, update), fields(path = update.path, branch = update.branch))]
    async fn update_file(&self, update: &FileUpdate<'_>) -> Result<String> {
        #[derive(serde::Serialize)]
        struct UpdateRequest<'a> {
            message: &'a str,
            content: String,
            sha: &'a str,
            branch: &'a str,
            committer: CommitterRaw<'a>,
        }

        #[derive(serde::Serialize)]
        struct CommitterRaw<'a> {
            name: &'a str,
            email: &'a str,
        }

        #[derive(serde::Deserialize)]
        struct UpdateResponseRaw {
            commit: CommitRaw,
        }

        #[derive(serde::Deserialize)]
        struct CommitRaw {
            sha: String,
        }

        let url = self.repo_url(&format!("contents/{}", update.path));
        let raw: UpdateResponseRaw = Self::send_json(
            self.request(Method::PUT, &url).json(&UpdateRequest {
                message: update.message,
                content: BASE64.encode(update.content),
                sha: update.blob_sha,
                branch: update.branch,
                committer: CommitterRaw {
                    name: &update.committer.name,
                    email: &update.committer.email,
                },
            }),
            "update file",
        )
        .await?;

        Ok(raw.commit.sha)
    }
}

/// Decode contents API payloads, which are base64 wrapped at 60 columns
fn decode_content(encoded: &str) -> Result<String> {
    let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64.decode(cleaned)?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use url::Url;

    fn client_for(server: &mockito::Server) -> GitHubClient {
        GitHubClient::new(&GitHubConfig {
            repo: RepoRef::parse("octocat/docs").unwrap(),
            token: "gh-token".to_string(),
            api_url: Url::parse(&server.url()).unwrap(),
        })
        .unwrap()
    }

    fn diff_entry(filename: &str, status: &str, patch: Option<&str>) -> serde_json::Value {
        let mut entry = serde_json::json!({
            "sha": "0123abcd",
            "filename": filename,
            "status": status,
            "additions": 1,
            "deletions": 0,
            "changes": 1,
            "blob_url": format!("https://github.com/octocat/docs/blob/head/{filename}"),
            "raw_url": format!("https://github.com/octocat/docs/raw/head/{filename}"),
            "contents_url": format!("https://api.github.com/repos/octocat/docs/contents/{filename}"),
        });
        if let Some(patch) = patch {
            entry["patch"] = serde_json::Value::String(patch.to_string());
        }
        entry
    }

    fn issue_comment(id: u64, body: &str) -> serde_json::Value {
        let user = "https://api.github.com/users/octocat";
        serde_json::json!({
            "id": id,
            "node_id": format!("IC_{id}"),
            "url": format!("https://api.github.com/repos/octocat/docs/issues/comments/{id}"),
            "html_url": format!("https://github.com/octocat/docs/pull/7#issuecomment-{id}"),
            "body": body,
            "user": {
                "login": "octocat",
                "id": 1,
                "node_id": "MDQ6VXNlcjE=",
                "avatar_url": "https://github.com/images/error/octocat_happy.gif",
                "gravatar_id": "",
                "url": user,
                "html_url": "https://github.com/octocat",
                "followers_url": format!("{user}/followers"),
                "following_url": format!("{user}/following"),
                "gists_url": format!("{user}/gists"),
                "starred_url": format!("{user}/starred"),
                "subscriptions_url": format!("{user}/subscriptions"),
                "organizations_url": format!("{user}/orgs"),
                "repos_url": format!("{user}/repos"),
                "events_url": format!("{user}/events"),
                "received_events_url": format!("{user}/received_events"),
                "type": "User",
                "site_admin": false,
            },
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:00:00Z",
        })
    }

    #[test]
    fn decodes_wrapped_base64() {
        assert_eq!(decode_content("SGVsbG8s\nIHdvcmxk\nIQ==\n").unwrap(), "Hello, world!");
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(decode_content("not base64!").is_err());
    }

    #[tokio::test]
    async fn add_reaction_posts_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/repos/octocat/docs/issues/comments/42/reactions")
            .match_header("authorization", "Bearer gh-token")
            .match_header("x-github-api-version", "2022-11-28")
            .match_body(Matcher::Json(serde_json::json!({"content": "eyes"})))
            .with_status(201)
            .with_body(r#"{"id": 1, "content": "eyes"}"#)
            .create_async()
            .await;

        client_for(&server).add_reaction(42, Reaction::Eyes).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_pr_files_follows_next_page() {
        let mut server = mockito::Server::new_async().await;
        let next = format!("{}/repos/octocat/docs/pulls/7/files?page=2", server.url());
        let first = server
            .mock("GET", "/repos/octocat/docs/pulls/7/files")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("link", &format!("<{next}>; rel=\"next\""))
            .with_body(
                serde_json::json!([diff_entry("docs/a.md", "added", Some("@@ -0,0 +1,2 @@\n+# A\n+Body."))])
                    .to_string(),
            )
            .create_async()
            .await;
        let second = server
            .mock("GET", "/repos/octocat/docs/pulls/7/files?page=2")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::json!([diff_entry("old.md", "removed", None)]).to_string())
            .create_async()
            .await;

        let files = client_for(&server).get_pr_files(7).await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(files.len(), 2);

        assert_eq!(files[0].path, "docs/a.md");
        assert_eq!(files[0].status, FileStatus::Added);
        let lines: Vec<(Option<u32>, &str)> = files[0].hunks[0]
            .lines
            .iter()
            .map(|l| (l.new_line, l.content.as_str()))
            .collect();
        assert_eq!(lines, vec![(Some(1), "# A"), (Some(2), "Body.")]);

        assert_eq!(files[1].path, "old.md");
        assert_eq!(files[1].status, FileStatus::Deleted);
        assert!(files[1].hunks.is_empty());
    }

    #[tokio::test]
    async fn list_comments_collects_every_page_in_order() {
        let mut server = mockito::Server::new_async().await;
        let next = format!("{}/repos/octocat/docs/issues/7/comments?page=2", server.url());
        server
            .mock("GET", "/repos/octocat/docs/issues/7/comments")
            .match_query(Matcher::UrlEncoded("per_page".into(), "100".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("link", &format!("<{next}>; rel=\"next\""))
            .with_body(
                serde_json::json!([issue_comment(1, "first"), issue_comment(2, "second")])
                    .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("GET", "/repos/octocat/docs/issues/7/comments")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::json!([issue_comment(3, "third")]).to_string())
            .create_async()
            .await;

        let comments = client_for(&server).list_comments(7).await.unwrap();

        let seen: Vec<(u64, &str)> = comments.iter().map(|c| (c.id, c.body.as_str())).collect();
        assert_eq!(seen, vec![(1, "first"), (2, "second"), (3, "third")]);
    }

    #[tokio::test]
    async fn get_file_content_decodes_and_keeps_blob_sha() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/octocat/docs/contents/docs/a.md")
            .match_query(Matcher::UrlEncoded("ref".into(), "feature/docs".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "name": "a.md",
                    "path": "docs/a.md",
                    "sha": "blob42",
                    "encoding": "base64",
                    "content": "SGVsbG8s\nIHdvcmxk\nIQ==\n",
                    "size": 13,
                    "type": "file",
                    "url": "https://api.github.com/repos/octocat/docs/contents/docs/a.md",
                    "html_url": "https://github.com/octocat/docs/blob/feature/docs/docs/a.md",
                    "git_url": "https://api.github.com/repos/octocat/docs/git/blobs/blob42",
                    "download_url": "https://raw.githubusercontent.com/octocat/docs/feature/docs/docs/a.md",
                    "_links": {
                        "self": "https://api.github.com/repos/octocat/docs/contents/docs/a.md",
                        "git": "https://api.github.com/repos/octocat/docs/git/blobs/blob42",
                        "html": "https://github.com/octocat/docs/blob/feature/docs/docs/a.md",
                    },
                })
                .to_string(),
            )
            .create_async()
            .await;

        let file = client_for(&server)
            .get_file_content("docs/a.md", "feature/docs")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(
            file,
            FileContent {
                text: "Hello, world!".to_string(),
                sha: "blob42".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn add_review_comment_targets_right_side() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/repos/octocat/docs/pulls/7/comments")
            .match_body(Matcher::Json(serde_json::json!({
                "body": "**Suggested Change:**",
                "commit_id": "abc123",
                "path": "docs/a.md",
                "line": 3,
                "side": "RIGHT",
            })))
            .with_status(201)
            .with_body(r#"{"id": 555, "html_url": "https://github.com/x"}"#)
            .create_async()
            .await;

        let id = client_for(&server)
            .add_review_comment(7, "abc123", "docs/a.md", 3, "**Suggested Change:**")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(id, 555);
    }

    #[tokio::test]
    async fn failed_request_includes_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/repos/octocat/docs/pulls/7/comments")
            .with_status(422)
            .with_body(r#"{"message": "line must be part of the diff"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .add_review_comment(7, "abc123", "a.md", 99, "body")
            .await
            .unwrap_err()
            .to_string();

        assert!(err.contains("Failed to create review comment"));
        assert!(err.contains("422"));
        assert!(err.contains("line must be part of the diff"));
    }

    #[tokio::test]
    async fn update_file_commits_to_branch() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/repos/octocat/docs/contents/docs/a.md")
            .match_body(Matcher::Json(serde_json::json!({
                "message": "Apply suggestions",
                "content": "SGVsbG8=",
                "sha": "blob1",
                "branch": "feature/docs",
                "committer": {"name": "bot", "email": "bot@example.com"},
            })))
            .with_status(200)
            .with_body(r#"{"content": {}, "commit": {"sha": "commit9"}}"#)
            .create_async()
            .await;

        let committer = Committer {
            name: "bot".to_string(),
            email: "bot@example.com".to_string(),
        };
        let sha = client_for(&server)
            .update_file(&FileUpdate {
                path: "docs/a.md",
                content: "Hello",
                blob_sha: "blob1",
                branch: "feature/docs",
                message: "Apply suggestions",
                committer: &committer,
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(sha, "commit9");
    }
}
