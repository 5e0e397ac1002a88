use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;

use crate::error::{AppError, GitErrorKind, Result};

/// Version-control capability surface used by the workflow. Knows nothing
/// about prompts, aider, or pull requests.
#[async_trait]
pub trait Vcs: Send + Sync {
    async fn current_branch(&self) -> Result<String>;

    async fn has_uncommitted_changes(&self) -> Result<bool>;

    async fn branch_exists(&self, name: &str) -> Result<bool>;

    /// Create `name` and switch to it, or just switch if it already exists.
    /// Calling twice with the same name is a no-op switch, not an error.
    async fn create_or_switch_branch(&self, name: &str) -> Result<()>;

    async fn stage_all(&self) -> Result<()>;

    /// Commit staged changes and return the commit hash. A clean index maps
    /// to `GitErrorKind::NothingToCommit`.
    async fn commit(&self, message: &str) -> Result<String>;

    /// Push `branch` to origin. Never force-pushes.
    async fn push(&self, branch: &str) -> Result<()>;

    async fn remote_url(&self) -> Result<String>;
}

/// Validate a branch name to prevent argument injection.
/// Rejects names starting with `-` as defence in depth.
fn validate_branch_name(name: &str) -> Result<()> {
    if name.starts_with('-') {
        return Err(AppError::Git {
            kind: GitErrorKind::Other,
            message: format!("Invalid branch name (starts with '-'): {name}"),
        });
    }
    Ok(())
}

/// Classify a failed git invocation from its captured stderr.
fn classify_git_failure(stderr: &str) -> GitErrorKind {
    let s = stderr.to_lowercase();
    if s.contains("authentication failed")
        || s.contains("could not read username")
        || s.contains("permission denied")
        || s.contains("invalid credentials")
    {
        GitErrorKind::Auth
    } else if s.contains("could not resolve host")
        || s.contains("connection refused")
        || s.contains("connection timed out")
        || s.contains("network is unreachable")
    {
        GitErrorKind::Network
    } else if s.contains("non-fast-forward") || s.contains("fetch first") || s.contains("[rejected]")
    {
        GitErrorKind::NonFastForward
    } else if s.contains("nothing to commit") || s.contains("nothing added to commit") {
        GitErrorKind::NothingToCommit
    } else {
        GitErrorKind::Other
    }
}

/// Adapter over the `git` binary. Each operation is one subprocess call with
/// stderr captured for diagnostics.
pub struct GitCli {
    repo_path: PathBuf,
}

impl GitCli {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    async fn run(&self, args: &[&str]) -> Result<Output> {
        let output = tokio::process::Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .output()
            .await
            .map_err(|e| AppError::Git {
                kind: GitErrorKind::Other,
                message: format!("Failed to spawn git {}: {e}", args.first().unwrap_or(&"")),
            })?;
        Ok(output)
    }

    /// Run git and require a zero exit, mapping failure to a classified error.
    async fn run_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self.run(args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let combined = format!("{stdout}{stderr}");
            return Err(AppError::Git {
                kind: classify_git_failure(&combined),
                message: format!("git {} failed: {}", args.join(" "), combined.trim()),
            });
        }
        Ok(output)
    }
}

#[async_trait]
impl Vcs for GitCli {
    async fn current_branch(&self) -> Result<String> {
        let output = self.run_checked(&["branch", "--show-current"]).await?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn has_uncommitted_changes(&self) -> Result<bool> {
        let output = self.run_checked(&["status", "--porcelain"]).await?;
        Ok(!output.stdout.is_empty())
    }

    async fn branch_exists(&self, name: &str) -> Result<bool> {
        validate_branch_name(name)?;
        let output = self
            .run(&["rev-parse", "--verify", "--quiet", &format!("refs/heads/{name}")])
            .await?;
        Ok(output.status.success())
    }

    async fn create_or_switch_branch(&self, name: &str) -> Result<()> {
        validate_branch_name(name)?;
        if self.branch_exists(name).await? {
            self.run_checked(&["checkout", name]).await?;
        } else {
            self.run_checked(&["checkout", "-b", name]).await?;
        }
        Ok(())
    }

    async fn stage_all(&self) -> Result<()> {
        self.run_checked(&["add", "."]).await?;
        Ok(())
    }

    async fn commit(&self, message: &str) -> Result<String> {
        if message.trim().is_empty() {
            return Err(AppError::Git {
                kind: GitErrorKind::Other,
                message: "Commit message must not be empty".to_string(),
            });
        }
        self.run_checked(&["commit", "-m", message]).await?;
        let output = self.run_checked(&["rev-parse", "HEAD"]).await?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn push(&self, branch: &str) -> Result<()> {
        validate_branch_name(branch)?;
        self.run_checked(&["push", "-u", "origin", branch]).await?;
        Ok(())
    }

    async fn remote_url(&self) -> Result<String> {
        let output = self.run_checked(&["remote", "get-url", "origin"]).await?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
