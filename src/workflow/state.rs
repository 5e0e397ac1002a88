use chrono::{DateTime, Utc};

use crate::aider::ModificationResult;
use crate::error::AppError;
use crate::remote::PullRequestResult;

/// States of one workflow run, in execution order. A run's furthest state
/// is reported even when a later step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Validating,
    BranchReady,
    Modified,
    Committed,
    Pushed,
    RequestOpened,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Validating => "validating environment",
            Stage::BranchReady => "branch ready",
            Stage::Modified => "modifications applied",
            Stage::Committed => "changes committed",
            Stage::Pushed => "branch pushed",
            Stage::RequestOpened => "pull request opened",
        };
        f.write_str(name)
    }
}

/// Per-run state record, owned by the orchestrator for the run's lifetime.
/// Fields are write-once: no step may overwrite a field set by an earlier
/// step.
#[derive(Debug)]
pub struct WorkflowState {
    pub prompt: String,
    pub branch_name: Option<String>,
    pub modification: Option<ModificationResult>,
    pub commit_id: Option<String>,
    pub pull_request: Option<PullRequestResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl WorkflowState {
    pub fn new(prompt: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            branch_name: None,
            modification: None,
            commit_id: None,
            pull_request: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn record_branch(&mut self, name: String) {
        debug_assert!(self.branch_name.is_none(), "branch_name is write-once");
        self.branch_name = Some(name);
    }

    pub fn record_modification(&mut self, result: ModificationResult) {
        debug_assert!(self.modification.is_none(), "modification is write-once");
        self.modification = Some(result);
    }

    pub fn record_commit(&mut self, id: String) {
        debug_assert!(self.commit_id.is_none(), "commit_id is write-once");
        self.commit_id = Some(id);
    }

    pub fn record_pull_request(&mut self, result: PullRequestResult) {
        debug_assert!(self.pull_request.is_none(), "pull_request is write-once");
        self.pull_request = Some(result);
    }

    pub fn finish(&mut self) {
        if self.finished_at.is_none() {
            self.finished_at = Some(Utc::now());
        }
    }

    pub fn duration_secs(&self) -> Option<f64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds() as f64 / 1000.0)
    }
}

/// Terminal result of a run: the state as far as it progressed, the furthest
/// stage, and the failure (if any). Partial progress is always surfaced so a
/// user can resume manually.
#[derive(Debug)]
pub struct WorkflowOutcome {
    pub state: WorkflowState,
    pub stage: Stage,
    pub error: Option<AppError>,
}

impl WorkflowOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn exit_code(&self) -> i32 {
        match &self.error {
            None => 0,
            Some(e) => e.exit_code(),
        }
    }

    /// Human-readable execution report for the terminal.
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        match &self.error {
            None => lines.push("Workflow completed".to_string()),
            Some(e) => {
                lines.push(format!("Workflow failed (furthest state: {})", self.stage));
                lines.push(format!("  error: {e}"));
                if let Some(hint) = e.hint() {
                    lines.push(format!("  hint: {hint}"));
                }
            }
        }

        if let Some(branch) = &self.state.branch_name {
            lines.push(format!("  branch: {branch}"));
        }
        match &self.state.commit_id {
            Some(id) => lines.push(format!("  commit: {}", &id[..id.len().min(8)])),
            None if self.stage >= Stage::Committed => {
                lines.push("  commit: none (no changes)".to_string())
            }
            None => {}
        }
        if let Some(modification) = &self.state.modification {
            lines.push(format!(
                "  modified files: {}",
                modification.modified_files.len()
            ));
        }
        if let Some(pr) = &self.state.pull_request {
            let url = pr.url.as_deref().unwrap_or("(no url)");
            match pr.number {
                Some(n) if pr.already_existed => {
                    lines.push(format!("  pull request: #{n} {url} (already open)"))
                }
                Some(n) => lines.push(format!("  pull request: #{n} {url}")),
                None => lines.push(format!("  pull request: {url}")),
            }
        }
        if let Some(duration) = self.state.duration_secs() {
            lines.push(format!("  duration: {duration:.1}s"));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GitErrorKind;

    #[test]
    fn test_stage_ordering_matches_pipeline() {
        assert!(Stage::Validating < Stage::BranchReady);
        assert!(Stage::BranchReady < Stage::Modified);
        assert!(Stage::Modified < Stage::Committed);
        assert!(Stage::Committed < Stage::Pushed);
        assert!(Stage::Pushed < Stage::RequestOpened);
    }

    #[test]
    fn test_report_success_with_noop_commit() {
        let mut state = WorkflowState::new("prompt");
        state.record_branch("aiderflow/x".to_string());
        state.finish();
        let outcome = WorkflowOutcome {
            state,
            stage: Stage::RequestOpened,
            error: None,
        };
        let report = outcome.report();
        assert!(report.contains("Workflow completed"));
        assert!(report.contains("commit: none (no changes)"));
    }

    #[test]
    fn test_report_failure_names_furthest_stage() {
        let mut state = WorkflowState::new("prompt");
        state.record_branch("aiderflow/x".to_string());
        state.finish();
        let outcome = WorkflowOutcome {
            state,
            stage: Stage::BranchReady,
            error: Some(AppError::Git {
                kind: GitErrorKind::Network,
                message: "could not resolve host".to_string(),
            }),
        };
        let report = outcome.report();
        assert!(report.contains("furthest state: branch ready"));
        assert!(report.contains("could not resolve host"));
        assert!(report.contains("hint:"));
        assert!(report.contains("branch: aiderflow/x"));
    }
}
