use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;

use crate::aider::probe_binary;
use crate::remote::RemoteHost;

/// One failed environment check, with enough context to fix it.
#[derive(Debug, Clone)]
pub struct MissingDependency {
    pub name: &'static str,
    pub detail: String,
    pub hint: &'static str,
}

impl std::fmt::Display for MissingDependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.name, self.detail, self.hint)
    }
}

/// Pre-flight environment validation. Runs every probe and reports every
/// problem at once; read-only, never mutates repository or remote state.
#[async_trait]
pub trait DependencyProbe: Send + Sync {
    async fn check_all(&self) -> Vec<MissingDependency>;
}

pub struct EnvironmentChecker<'a> {
    repo_path: PathBuf,
    remote: &'a dyn RemoteHost,
    aider_binary: String,
    git_binary: String,
}

impl<'a> EnvironmentChecker<'a> {
    pub fn new(repo_path: impl Into<PathBuf>, remote: &'a dyn RemoteHost) -> Self {
        Self {
            repo_path: repo_path.into(),
            remote,
            aider_binary: "aider".to_string(),
            git_binary: "git".to_string(),
        }
    }

    #[cfg(test)]
    fn with_binaries(mut self, aider: &str, git: &str) -> Self {
        self.aider_binary = aider.to_string();
        self.git_binary = git.to_string();
        self
    }

    async fn git_probe(&self, args: &[&str]) -> bool {
        let run = tokio::process::Command::new(&self.git_binary)
            .args(args)
            .current_dir(&self.repo_path)
            .stdin(Stdio::null())
            .output();
        match tokio::time::timeout(Duration::from_secs(10), run).await {
            Ok(Ok(output)) => output.status.success(),
            _ => false,
        }
    }

    async fn has_remote(&self) -> bool {
        let run = tokio::process::Command::new(&self.git_binary)
            .args(["remote"])
            .current_dir(&self.repo_path)
            .stdin(Stdio::null())
            .output();
        match tokio::time::timeout(Duration::from_secs(10), run).await {
            Ok(Ok(output)) => {
                output.status.success() && !String::from_utf8_lossy(&output.stdout).trim().is_empty()
            }
            _ => false,
        }
    }
}

#[async_trait]
impl DependencyProbe for EnvironmentChecker<'_> {
    async fn check_all(&self) -> Vec<MissingDependency> {
        let mut missing = Vec::new();

        if !probe_binary(&self.aider_binary).await {
            missing.push(MissingDependency {
                name: "aider",
                detail: "aider is not installed or not responding".to_string(),
                hint: "install it with `pip install aider-chat`",
            });
        }

        if !probe_binary(&self.git_binary).await {
            missing.push(MissingDependency {
                name: "git",
                detail: "git is not installed or not responding".to_string(),
                hint: "install git and make sure it is on PATH",
            });
        } else {
            // Repository-level checks only make sense when git itself works
            if !self.git_probe(&["rev-parse", "--git-dir"]).await {
                missing.push(MissingDependency {
                    name: "git-repo",
                    detail: format!(
                        "{} is not inside a git repository",
                        self.repo_path.display()
                    ),
                    hint: "run the tool from a repository, or `git init` one",
                });
            } else if !self.has_remote().await {
                missing.push(MissingDependency {
                    name: "git-remote",
                    detail: "the repository has no configured remote".to_string(),
                    hint: "add one with `git remote add origin <url>`",
                });
            }
        }

        if !self.remote.verify_access().await {
            missing.push(MissingDependency {
                name: "github-access",
                detail: "the GitHub API rejected the configured token or repository".to_string(),
                hint: "check the token, its permissions, and network connectivity",
            });
        }

        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::remote::{CreatePullRequest, PullRequestResult};

    struct StubRemote {
        accessible: bool,
    }

    #[async_trait]
    impl RemoteHost for StubRemote {
        async fn verify_access(&self) -> bool {
            self.accessible
        }

        async fn create_pull_request(
            &self,
            _request: &CreatePullRequest,
        ) -> Result<PullRequestResult> {
            unreachable!("validator never opens pull requests")
        }
    }

    #[tokio::test]
    async fn test_reports_every_missing_dependency_in_one_pass() {
        let tmp = tempfile::tempdir().unwrap();
        let remote = StubRemote { accessible: false };
        // Both binaries bogus: aider, git, and github-access must all appear
        let checker = EnvironmentChecker::new(tmp.path(), &remote)
            .with_binaries("aiderflow-missing-aider", "aiderflow-missing-git");

        let missing = checker.check_all().await;
        let names: Vec<&str> = missing.iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["aider", "git", "github-access"]);
    }

    #[tokio::test]
    async fn test_non_repository_directory_is_flagged() {
        let tmp = tempfile::tempdir().unwrap();
        let remote = StubRemote { accessible: true };
        let checker = EnvironmentChecker::new(tmp.path(), &remote)
            .with_binaries("aiderflow-missing-aider", "git");

        let missing = checker.check_all().await;
        let names: Vec<&str> = missing.iter().map(|d| d.name).collect();
        assert!(names.contains(&"git-repo"));
        assert!(!names.contains(&"github-access"));
    }
}
