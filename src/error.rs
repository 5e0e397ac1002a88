use thiserror::Error;

use crate::deps::MissingDependency;

/// How a git operation failed. Drives both the remediation hint and the
/// orchestrator's decision to treat some failures as soft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitErrorKind {
    Auth,
    Network,
    NonFastForward,
    /// `git commit` with a clean index. Soft: the orchestrator may skip the
    /// commit instead of aborting.
    NothingToCommit,
    Other,
}

/// How a GitHub API call failed. `Conflict` is classified here but never
/// escapes `GitHubRemote`: an already-open pull request for the same head
/// branch is recovered as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubErrorKind {
    Auth,
    Network,
    Validation,
    Conflict,
    Other,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{}", format_missing(.0))]
    Dependency(Vec<MissingDependency>),

    #[error("Git operation failed: {message}")]
    Git { kind: GitErrorKind, message: String },

    #[error("Aider execution failed: {0}")]
    AiderExecution(String),

    #[error("GitHub API error: {message}")]
    GitHub {
        kind: GitHubErrorKind,
        message: String,
    },

    #[error("Interrupted")]
    Interrupted,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn format_missing(missing: &[MissingDependency]) -> String {
    let names: Vec<&str> = missing.iter().map(|d| d.name).collect();
    format!(
        "{} missing or unusable dependencies: {}",
        missing.len(),
        names.join(", ")
    )
}

impl AppError {
    /// Process exit code for this failure. The mapping is part of the CLI
    /// contract and must stay stable:
    ///
    /// 0 success, 1 unexpected, 2 configuration, 3 dependency, 4 git,
    /// 5 aider execution, 6 GitHub, 130 interrupted.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) => 2,
            AppError::Dependency(_) => 3,
            AppError::Git { .. } => 4,
            AppError::AiderExecution(_) => 5,
            AppError::GitHub { .. } => 6,
            AppError::Interrupted => 130,
            _ => 1,
        }
    }

    /// A short remediation hint, when one follows from the failure kind.
    /// Never speculates past what the captured diagnostic supports.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            AppError::Config(_) => Some("run `aiderflow --init` to create a starter config file"),
            AppError::Dependency(_) => Some("run `aiderflow --check` for a full environment report"),
            AppError::Git { kind, .. } => match kind {
                GitErrorKind::Auth => Some("check your git credentials for the remote"),
                GitErrorKind::Network => Some("check network connectivity to the remote"),
                GitErrorKind::NonFastForward => {
                    Some("the remote branch has diverged; fetch and inspect it before re-running")
                }
                _ => None,
            },
            AppError::GitHub { kind, .. } => match kind {
                GitHubErrorKind::Auth => Some("check the GitHub token and its permissions"),
                GitHubErrorKind::Network => Some("check network connectivity to the GitHub API"),
                _ => None,
            },
            _ => None,
        }
    }
}

impl From<octocrab::Error> for AppError {
    fn from(e: octocrab::Error) -> Self {
        AppError::GitHub {
            kind: GitHubErrorKind::Other,
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_stable() {
        assert_eq!(AppError::Config("x".into()).exit_code(), 2);
        assert_eq!(AppError::Dependency(vec![]).exit_code(), 3);
        assert_eq!(
            AppError::Git {
                kind: GitErrorKind::Other,
                message: "x".into()
            }
            .exit_code(),
            4
        );
        assert_eq!(AppError::AiderExecution("x".into()).exit_code(), 5);
        assert_eq!(
            AppError::GitHub {
                kind: GitHubErrorKind::Auth,
                message: "x".into()
            }
            .exit_code(),
            6
        );
        assert_eq!(AppError::Interrupted.exit_code(), 130);
        assert_eq!(AppError::Internal("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_hints_follow_failure_kind() {
        let auth = AppError::Git {
            kind: GitErrorKind::Auth,
            message: "denied".into(),
        };
        assert!(auth.hint().unwrap().contains("credentials"));

        let nothing = AppError::Git {
            kind: GitErrorKind::NothingToCommit,
            message: "clean".into(),
        };
        assert!(nothing.hint().is_none());
    }
}
