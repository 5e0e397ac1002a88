use async_trait::async_trait;
use octocrab::Octocrab;

use crate::error::{AppError, GitHubErrorKind, Result};
use crate::remote::{CreatePullRequest, PullRequestResult, RemoteHost};

/// GitHub implementation of `RemoteHost`, authenticated with a personal
/// token.
pub struct GitHubRemote {
    client: Octocrab,
    owner: String,
    repo: String,
}

impl GitHubRemote {
    pub fn new(token: &str, owner: &str, repo: &str) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .map_err(|e| AppError::GitHub {
                kind: GitHubErrorKind::Other,
                message: format!("Failed to build octocrab client: {e}"),
            })?;

        Ok(Self {
            client,
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    /// Look up an open pull request whose head is `branch`.
    async fn find_open_pull_request(&self, branch: &str) -> Result<Option<PullRequestResult>> {
        let page = self
            .client
            .pulls(&self.owner, &self.repo)
            .list()
            .state(octocrab::params::State::Open)
            .head(format!("{}:{}", self.owner, branch))
            .per_page(1)
            .send()
            .await
            .map_err(classify_octocrab_error)?;

        Ok(page.items.into_iter().next().map(|pr| PullRequestResult {
            url: pr.html_url.map(|u| u.to_string()),
            number: Some(pr.number),
            already_existed: true,
        }))
    }
}

#[async_trait]
impl RemoteHost for GitHubRemote {
    async fn verify_access(&self) -> bool {
        if self.client.current().user().await.is_err() {
            return false;
        }
        self.client
            .repos(&self.owner, &self.repo)
            .get()
            .await
            .is_ok()
    }

    async fn create_pull_request(&self, request: &CreatePullRequest) -> Result<PullRequestResult> {
        let created = self
            .client
            .pulls(&self.owner, &self.repo)
            .create(
                &request.title,
                &request.head_branch,
                &request.base_branch,
            )
            .body(&request.body)
            .send()
            .await;

        match created {
            Ok(pr) => Ok(PullRequestResult {
                url: pr.html_url.map(|u| u.to_string()),
                number: Some(pr.number),
                already_existed: false,
            }),
            Err(e) => {
                let mapped = classify_octocrab_error(e);
                if let AppError::GitHub {
                    kind: GitHubErrorKind::Conflict,
                    ref message,
                } = mapped
                {
                    // An open PR for this head already exists; surface it as
                    // success so re-runs stay idempotent.
                    tracing::info!(
                        head = %request.head_branch,
                        "Pull request already exists, reusing it"
                    );
                    if let Some(existing) =
                        self.find_open_pull_request(&request.head_branch).await?
                    {
                        return Ok(existing);
                    }
                    return Err(AppError::GitHub {
                        kind: GitHubErrorKind::Validation,
                        message: format!(
                            "GitHub reported an existing pull request but none was found: {message}"
                        ),
                    });
                }
                Err(mapped)
            }
        }
    }
}

/// Map an octocrab error into the failure taxonomy: auth, network,
/// validation, or conflict (already-open pull request).
fn classify_octocrab_error(e: octocrab::Error) -> AppError {
    match e {
        octocrab::Error::GitHub { source, .. } => {
            let status = source.status_code.as_u16();
            let detail = source
                .errors
                .as_ref()
                .map(|errs| serde_json::to_string(errs).unwrap_or_default())
                .unwrap_or_default();
            let message = format!("{} (status {status}) {detail}", source.message);

            let kind = match status {
                401 | 403 => GitHubErrorKind::Auth,
                422 if message.to_lowercase().contains("already exists") => {
                    GitHubErrorKind::Conflict
                }
                422 => GitHubErrorKind::Validation,
                _ => GitHubErrorKind::Other,
            };
            AppError::GitHub { kind, message }
        }
        // Anything that never reached the API is a transport problem
        other => AppError::GitHub {
            kind: GitHubErrorKind::Network,
            message: other.to_string(),
        },
    }
}
