//! Pull request publishing results.

use serde::Serialize;

/// A pull request opened on the repository host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestInfo {
    pub pr_number: u64,
    pub pr_url: String,
    pub branch: String,
}

/// Serializable publish result, as handed to the rendering layer.
///
/// Success carries the PR number, URL and working branch; failure
/// carries only the error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestOutcome {
    pub success: bool,
    #[serde(flatten)]
    pub pull_request: Option<PullRequestInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PullRequestOutcome {
    pub fn succeeded(info: PullRequestInfo) -> Self {
        Self {
            success: true,
            pull_request: Some(info),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            pull_request: None,
            error: Some(error.into()),
        }
    }
}

impl<E: std::fmt::Display> From<Result<PullRequestInfo, E>> for PullRequestOutcome {
    fn from(result: Result<PullRequestInfo, E>) -> Self {
        match result {
            Ok(info) => Self::succeeded(info),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}
