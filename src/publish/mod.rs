//! Publishing generated files to a repository host as a pull request.
//!
//! The [`Publisher`] runs a strictly sequential state machine against a
//! [`RepositoryHost`]: validate the token, resolve the repository and
//! base branch, create a working branch, write every file, then open the
//! pull request. Each step fails fast with its own [`PublishError`]
//! variant. Nothing is retried and nothing is rolled back: once the
//! working branch exists, every later error names it so the caller can
//! clean it up.

pub mod github;
pub mod session;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::constants::WORKING_BRANCH_PREFIX;
use crate::models::{ContentMap, PullRequestInfo};

pub use session::{RepositorySession, SessionRegistry};

/// Errors from a single repository host call.
#[derive(Error, Debug)]
pub enum HostError {
    #[error("not found")]
    NotFound,

    #[error("bad credentials")]
    Unauthorized,

    #[error("access denied: {0}")]
    Forbidden(String),

    /// The request conflicts with existing state (e.g. the ref exists).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// The authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub public_repos: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
    /// `owner/name`.
    pub full_name: String,
    pub default_branch: String,
}

/// A branch and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchHead {
    pub name: String,
    pub commit_sha: String,
}

/// A file as it currently exists on a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub content: String,
    /// Content hash; required as the concurrency token when updating.
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedPullRequest {
    pub number: u64,
    pub url: String,
}

/// Repository, branch, file and pull request operations on a code host.
///
/// Implementations hold their own credential; one instance serves one
/// session.
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// The account the credential belongs to.
    async fn authenticate(&self) -> Result<UserProfile, HostError>;

    /// Full names of every repository the account can access.
    async fn list_repositories(&self) -> Result<Vec<String>, HostError>;

    async fn list_branches(&self, repo: &str) -> Result<Vec<String>, HostError>;

    async fn get_repository(&self, repo: &str) -> Result<Repository, HostError>;

    async fn get_branch(&self, repo: &str, branch: &str) -> Result<BranchHead, HostError>;

    async fn create_branch(&self, repo: &str, branch: &str, from_sha: &str) -> Result<(), HostError>;

    /// The file at `path` on `branch`, or `None` if it does not exist.
    async fn get_file(
        &self,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<Option<RemoteFile>, HostError>;

    async fn create_file(
        &self,
        repo: &str,
        path: &str,
        content: &str,
        message: &str,
        branch: &str,
    ) -> Result<(), HostError>;

    async fn update_file(
        &self,
        repo: &str,
        path: &str,
        content: &str,
        message: &str,
        branch: &str,
        sha: &str,
    ) -> Result<(), HostError>;

    async fn create_pull_request(
        &self,
        repo: &str,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<CreatedPullRequest, HostError>;
}

/// Errors from the publish state machine, one per failing step.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("no content provided for the pull request")]
    EmptyContent,

    #[error("repository host rejected the credential: {0}")]
    Unauthorized(#[source] HostError),

    #[error("repository '{repo}' not found")]
    RepoNotFound { repo: String },

    #[error("cannot access repository '{repo}': {source}")]
    AccessDenied {
        repo: String,
        #[source]
        source: HostError,
    },

    #[error("branch '{branch}' not found in '{repo}'")]
    BranchNotFound { repo: String, branch: String },

    #[error("cannot create branch '{branch}': {source}")]
    BranchCreateFailed {
        branch: String,
        #[source]
        source: HostError,
    },

    #[error(
        "failed to write '{path}' on branch '{branch}' ({} file(s) already written): {source}",
        .written.len()
    )]
    FileWriteFailed {
        path: String,
        branch: String,
        /// Paths written to the working branch before the failure.
        written: Vec<String>,
        #[source]
        source: HostError,
    },

    #[error("failed to open pull request from '{branch}': {source}")]
    PullRequestFailed {
        branch: String,
        #[source]
        source: HostError,
    },

    #[error("repository host error: {0}")]
    Host(#[from] HostError),
}

impl PublishError {
    /// The working branch left behind by this failure, if one was created.
    pub fn orphaned_branch(&self) -> Option<&str> {
        match self {
            PublishError::FileWriteFailed { branch, .. }
            | PublishError::PullRequestFailed { branch, .. } => Some(branch),
            _ => None,
        }
    }
}

/// What to publish and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    /// `owner/name`.
    pub repo: String,
    pub base_branch: String,
    pub files: ContentMap,
    pub title: String,
    pub body: String,
    pub commit_message: String,
}

/// A fresh working branch name: `auto-docs-` plus 8 random hex digits.
pub fn working_branch_name() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{WORKING_BRANCH_PREFIX}{}", &id[..8])
}

/// Sequences host calls to turn a content map into a pull request.
pub struct Publisher<'a> {
    host: &'a dyn RepositoryHost,
    branch_name: fn() -> String,
}

impl<'a> Publisher<'a> {
    pub fn new(host: &'a dyn RepositoryHost) -> Self {
        Self {
            host,
            branch_name: working_branch_name,
        }
    }

    /// Use a fixed branch-name generator instead of random names.
    pub fn with_branch_name(mut self, branch_name: fn() -> String) -> Self {
        self.branch_name = branch_name;
        self
    }

    /// Run the full publish sequence.
    pub async fn publish(&self, request: &PublishRequest) -> Result<PullRequestInfo, PublishError> {
        if request.files.is_empty() {
            return Err(PublishError::EmptyContent);
        }
        let repo = request.repo.as_str();

        let user = self
            .host
            .authenticate()
            .await
            .map_err(PublishError::Unauthorized)?;
        tracing::info!(user = %user.login, "validated repository credential");

        self.host.get_repository(repo).await.map_err(|e| match e {
            HostError::NotFound => PublishError::RepoNotFound {
                repo: repo.to_string(),
            },
            source @ (HostError::Forbidden(_) | HostError::Unauthorized) => {
                PublishError::AccessDenied {
                    repo: repo.to_string(),
                    source,
                }
            }
            other => PublishError::Host(other),
        })?;
        tracing::info!(repo, "resolved repository");

        let base = self
            .host
            .get_branch(repo, &request.base_branch)
            .await
            .map_err(|e| match e {
                HostError::NotFound => PublishError::BranchNotFound {
                    repo: repo.to_string(),
                    branch: request.base_branch.clone(),
                },
                other => PublishError::Host(other),
            })?;
        tracing::info!(branch = %base.name, sha = %base.commit_sha, "resolved base branch");

        let branch = (self.branch_name)();
        self.host
            .create_branch(repo, &branch, &base.commit_sha)
            .await
            .map_err(|source| PublishError::BranchCreateFailed {
                branch: branch.clone(),
                source,
            })?;
        tracing::info!(branch = %branch, "created working branch");

        let mut written = Vec::with_capacity(request.files.len());
        for (path, content) in &request.files {
            if let Err(source) = self
                .write_file(repo, path, content, &request.commit_message, &branch)
                .await
            {
                tracing::warn!(path = %path, branch = %branch, error = %source, "file write failed");
                return Err(PublishError::FileWriteFailed {
                    path: path.clone(),
                    branch,
                    written,
                    source,
                });
            }
            written.push(path.clone());
        }

        let pr = self
            .host
            .create_pull_request(repo, &branch, &request.base_branch, &request.title, &request.body)
            .await
            .map_err(|source| PublishError::PullRequestFailed {
                branch: branch.clone(),
                source,
            })?;
        tracing::info!(number = pr.number, url = %pr.url, "opened pull request");

        Ok(PullRequestInfo {
            pr_number: pr.number,
            pr_url: pr.url,
            branch,
        })
    }

    /// Update the file if it exists on the branch, otherwise create it.
    async fn write_file(
        &self,
        repo: &str,
        path: &str,
        content: &str,
        message: &str,
        branch: &str,
    ) -> Result<(), HostError> {
        match self.host.get_file(repo, path, branch).await? {
            Some(existing) => {
                tracing::debug!(path, "updating existing file");
                self.host
                    .update_file(repo, path, content, message, branch, &existing.sha)
                    .await
            }
            None => {
                tracing::debug!(path, "creating file");
                self.host.create_file(repo, path, content, message, branch).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn working_branch_name_shape() {
        let name = working_branch_name();
        let suffix = name.strip_prefix("auto-docs-").unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(working_branch_name(), working_branch_name());
    }

    #[test]
    fn orphaned_branch_is_named_after_creation() {
        let err = PublishError::FileWriteFailed {
            path: "b.md".into(),
            branch: "auto-docs-12345678".into(),
            written: vec!["a.md".into()],
            source: HostError::Conflict("sha mismatch".into()),
        };
        assert_eq!(err.orphaned_branch(), Some("auto-docs-12345678"));
        let message = err.to_string();
        assert!(message.contains("'b.md'"));
        assert!(message.contains("1 file(s) already written"));

        let early = PublishError::BranchNotFound {
            repo: "o/r".into(),
            branch: "main".into(),
        };
        assert_eq!(early.orphaned_branch(), None);
    }
}
