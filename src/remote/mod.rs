pub mod github;

use async_trait::async_trait;

use crate::error::Result;

pub use github::GitHubRemote;

/// Request to open a pull request.
#[derive(Debug, Clone)]
pub struct CreatePullRequest {
    pub title: String,
    pub body: String,
    pub head_branch: String,
    pub base_branch: String,
}

/// Outcome of a pull-request creation. Produced once, immutable thereafter.
#[derive(Debug, Clone)]
pub struct PullRequestResult {
    pub url: Option<String>,
    pub number: Option<u64>,
    /// True when an already-open request for the same head branch was
    /// returned instead of a newly created one.
    pub already_existed: bool,
}

/// Remote-hosting surface used by the workflow: one access probe and one
/// pull-request call.
#[async_trait]
pub trait RemoteHost: Send + Sync {
    /// One lightweight authenticated call plus a repository visibility
    /// check. Read-only.
    async fn verify_access(&self) -> bool;

    /// Open a pull request. An existing open request for the same head
    /// branch is returned as success, since re-running the workflow against
    /// an unmerged branch is expected usage.
    async fn create_pull_request(&self, request: &CreatePullRequest) -> Result<PullRequestResult>;
}
