//! GitHub REST implementation of [`RepositoryHost`].
//!
//! Talks to `api.github.com` (or a GitHub Enterprise base URL) with a
//! bearer token. File contents travel base64-encoded through the
//! contents API; a 404 on a contents lookup means "create, not update".

use std::fmt;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{BranchHead, CreatedPullRequest, HostError, RemoteFile, Repository, RepositoryHost, UserProfile};
use crate::config::GitHubConfig;
use crate::constants::USER_AGENT;

/// Page size for list endpoints (GitHub's maximum).
const PER_PAGE: usize = 100;

/// Repository host backed by the GitHub REST API.
pub struct GitHubHost {
    client: reqwest::Client,
    api_url: String,
}

impl fmt::Debug for GitHubHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubHost")
            .field("api_url", &self.api_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl GitHubHost {
    /// Build a client for `token` using the `[github]` config section.
    pub fn new(token: &str, config: &GitHubConfig) -> Result<Self, HostError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|_| HostError::Unauthorized)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static("2022-11-28"));

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
        })
    }

    /// `{api_url}/{segments...}`, each `/`-separated piece percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, HostError> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| HostError::Decode(format!("invalid API URL {}: {e}", self.api_url)))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| HostError::Decode(format!("API URL cannot be a base: {}", self.api_url)))?;
            path.pop_if_empty();
            for segment in segments {
                path.extend(segment.split('/').filter(|s| !s.is_empty()));
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned + Send>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<T, HostError> {
        let response = self.client.get(url).query(query).send().await?;
        decode(check(response).await?).await
    }

    /// Collect every page of a list endpoint.
    async fn get_all_pages<T: DeserializeOwned + Send>(&self, url: Url) -> Result<Vec<T>, HostError> {
        let per_page = PER_PAGE.to_string();
        let mut items = Vec::new();
        for page in 1.. {
            let page = page.to_string();
            let batch: Vec<T> = self
                .get_json(url.clone(), &[("per_page", per_page.as_str()), ("page", page.as_str())])
                .await?;
            let done = batch.len() < PER_PAGE;
            items.extend(batch);
            if done {
                break;
            }
        }
        Ok(items)
    }

    async fn put_contents(
        &self,
        repo: &str,
        path: &str,
        body: serde_json::Value,
    ) -> Result<(), HostError> {
        let url = self.endpoint(&["repos", repo, "contents", path])?;
        let response = self.client.put(url).json(&body).send().await?;
        check(response).await?;
        Ok(())
    }
}

/// Map a non-success response to the matching [`HostError`].
async fn check(response: Response) -> Result<Response, HostError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string());
    tracing::debug!(status = status.as_u16(), %body, "GitHub request failed");
    Err(match status.as_u16() {
        401 => HostError::Unauthorized,
        403 => HostError::Forbidden(body),
        404 => HostError::NotFound,
        409 | 422 => HostError::Conflict(body),
        code => HostError::Api { status: code, body },
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, HostError> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| HostError::Decode(e.to_string()))
}

#[derive(Deserialize)]
struct UserResponse {
    login: String,
    name: Option<String>,
    avatar_url: Option<String>,
    #[serde(default)]
    public_repos: u64,
}

#[derive(Deserialize)]
struct RepoResponse {
    full_name: String,
    #[serde(default)]
    default_branch: String,
}

#[derive(Deserialize)]
struct BranchResponse {
    name: String,
    commit: CommitRef,
}

#[derive(Deserialize)]
struct CommitRef {
    sha: String,
}

#[derive(Deserialize)]
struct BranchListItem {
    name: String,
}

#[derive(Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct PullResponse {
    number: u64,
    html_url: String,
}

/// Decode a contents-API payload, which is base64 with embedded newlines.
fn decode_content(encoded: &str) -> Result<String, HostError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = BASE64
        .decode(compact)
        .map_err(|e| HostError::Decode(format!("file content is not base64: {e}")))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[async_trait]
impl RepositoryHost for GitHubHost {
    async fn authenticate(&self) -> Result<UserProfile, HostError> {
        let user: UserResponse = self.get_json(self.endpoint(&["user"])?, &[]).await?;
        Ok(UserProfile {
            login: user.login,
            name: user.name,
            avatar_url: user.avatar_url,
            public_repos: user.public_repos,
        })
    }

    async fn list_repositories(&self) -> Result<Vec<String>, HostError> {
        let repos: Vec<RepoResponse> = self.get_all_pages(self.endpoint(&["user", "repos"])?).await?;
        Ok(repos.into_iter().map(|r| r.full_name).collect())
    }

    async fn list_branches(&self, repo: &str) -> Result<Vec<String>, HostError> {
        let branches: Vec<BranchListItem> = self
            .get_all_pages(self.endpoint(&["repos", repo, "branches"])?)
            .await?;
        Ok(branches.into_iter().map(|b| b.name).collect())
    }

    async fn get_repository(&self, repo: &str) -> Result<Repository, HostError> {
        let r: RepoResponse = self.get_json(self.endpoint(&["repos", repo])?, &[]).await?;
        Ok(Repository {
            full_name: r.full_name,
            default_branch: r.default_branch,
        })
    }

    async fn get_branch(&self, repo: &str, branch: &str) -> Result<BranchHead, HostError> {
        let b: BranchResponse = self
            .get_json(self.endpoint(&["repos", repo, "branches", branch])?, &[])
            .await?;
        Ok(BranchHead {
            name: b.name,
            commit_sha: b.commit.sha,
        })
    }

    async fn create_branch(&self, repo: &str, branch: &str, from_sha: &str) -> Result<(), HostError> {
        let url = self.endpoint(&["repos", repo, "git", "refs"])?;
        let body = serde_json::json!({
            "ref": format!("refs/heads/{branch}"),
            "sha": from_sha,
        });
        let response = self.client.post(url).json(&body).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn get_file(
        &self,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<Option<RemoteFile>, HostError> {
        let url = self.endpoint(&["repos", repo, "contents", path])?;
        let response = self.client.get(url).query(&[("ref", branch)]).send().await?;
        let response = match check(response).await {
            Ok(r) => r,
            Err(HostError::NotFound) => return Ok(None),
            Err(e) => return Err(e),
        };
        let file: ContentsResponse = decode(response).await?;
        let content = match file.content.as_deref() {
            Some(encoded) => decode_content(encoded)?,
            None => String::new(),
        };
        Ok(Some(RemoteFile {
            content,
            sha: file.sha,
        }))
    }

    async fn create_file(
        &self,
        repo: &str,
        path: &str,
        content: &str,
        message: &str,
        branch: &str,
    ) -> Result<(), HostError> {
        let body = serde_json::json!({
            "message": message,
            "content": BASE64.encode(content),
            "branch": branch,
        });
        self.put_contents(repo, path, body).await
    }

    async fn update_file(
        &self,
        repo: &str,
        path: &str,
        content: &str,
        message: &str,
        branch: &str,
        sha: &str,
    ) -> Result<(), HostError> {
        let body = serde_json::json!({
            "message": message,
            "content": BASE64.encode(content),
            "branch": branch,
            "sha": sha,
        });
        self.put_contents(repo, path, body).await
    }

    async fn create_pull_request(
        &self,
        repo: &str,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<CreatedPullRequest, HostError> {
        let url = self.endpoint(&["repos", repo, "pulls"])?;
        let payload = serde_json::json!({
            "title": title,
            "body": body,
            "head": head,
            "base": base,
        });
        let response = self.client.post(url).json(&payload).send().await?;
        let pr: PullResponse = decode(check(response).await?).await?;
        Ok(CreatedPullRequest {
            number: pr.number,
            url: pr.html_url,
        })
    }
}
