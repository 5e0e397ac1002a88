use chrono::Utc;

use crate::aider::Modifier;
use crate::branch;
use crate::config::AppConfig;
use crate::deps::DependencyProbe;
use crate::error::{AppError, GitErrorKind, Result};
use crate::remote::{CreatePullRequest, RemoteHost};
use crate::templates;
use crate::vcs::Vcs;
use crate::workflow::state::{Stage, WorkflowOutcome, WorkflowState};

/// Drives one workflow run through its fixed sequence: validate, branch,
/// modify, commit, push, open pull request. Owns the run's `WorkflowState`;
/// must not run concurrently against the same working tree.
pub struct Orchestrator<'a> {
    config: &'a AppConfig,
    deps: &'a dyn DependencyProbe,
    vcs: &'a dyn Vcs,
    modifier: &'a dyn Modifier,
    remote: &'a dyn RemoteHost,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a AppConfig,
        deps: &'a dyn DependencyProbe,
        vcs: &'a dyn Vcs,
        modifier: &'a dyn Modifier,
        remote: &'a dyn RemoteHost,
    ) -> Self {
        Self {
            config,
            deps,
            vcs,
            modifier,
            remote,
        }
    }

    /// Execute the full pipeline. Never panics on step failure: the outcome
    /// carries the state as far as it progressed plus the typed error.
    pub async fn run(&self, prompt: &str, branch_override: Option<&str>) -> WorkflowOutcome {
        let mut state = WorkflowState::new(prompt);
        let mut stage = Stage::Validating;

        let error = self
            .drive(prompt, branch_override, &mut state, &mut stage)
            .await
            .err();
        state.finish();

        match &error {
            None => tracing::info!(stage = %stage, "Workflow completed"),
            Some(e) => tracing::error!(stage = %stage, error = %e, "Workflow failed"),
        }

        WorkflowOutcome {
            state,
            stage,
            error,
        }
    }

    async fn drive(
        &self,
        prompt: &str,
        branch_override: Option<&str>,
        state: &mut WorkflowState,
        stage: &mut Stage,
    ) -> Result<()> {
        // 1. Validate environment; abort before any mutating step
        tracing::info!("Validating environment");
        let missing = self.deps.check_all().await;
        if !missing.is_empty() {
            for dep in &missing {
                tracing::error!(dependency = dep.name, detail = %dep.detail, "Missing dependency");
            }
            return Err(AppError::Dependency(missing));
        }

        // 2. Create or switch to the working branch
        let branch_name = match branch_override {
            Some(name) => branch::sanitize(name),
            None => branch::generate(prompt, &self.config.git.branch_prefix, Utc::now()),
        };
        self.vcs.create_or_switch_branch(&branch_name).await?;
        state.record_branch(branch_name.clone());
        *stage = Stage::BranchReady;
        tracing::info!(branch = %branch_name, "Branch ready");

        // 3. Run aider. On failure the branch is left in place for
        // inspection and no commit is attempted.
        tracing::info!("Running aider (this can take minutes)");
        let modification = self.modifier.invoke(prompt).await?;
        if !modification.success {
            let message = modification
                .error_message
                .clone()
                .unwrap_or_else(|| "aider reported failure".to_string());
            state.record_modification(modification);
            return Err(AppError::AiderExecution(message));
        }
        tracing::info!(
            files = modification.modified_files.len(),
            summary = %modification.summary,
            "Aider finished"
        );
        state.record_modification(modification.clone());
        *stage = Stage::Modified;

        // 4. Commit. A clean tree is success-with-no-op: aider commits on
        // its own by default, and it may legitimately decide nothing needs
        // changing. commit_id stays None in both cases.
        if self.vcs.has_uncommitted_changes().await? {
            self.vcs.stage_all().await?;
            let message =
                templates::render_commit_message(&self.config.templates, &modification, prompt);
            match self.vcs.commit(&message).await {
                Ok(id) => {
                    tracing::info!(commit = %&id[..id.len().min(8)], "Changes committed");
                    state.record_commit(id);
                }
                Err(AppError::Git {
                    kind: GitErrorKind::NothingToCommit,
                    ..
                }) => {
                    tracing::info!("Index clean after staging, advancing without a commit");
                }
                Err(e) => return Err(e),
            }
        } else {
            tracing::info!("Working tree clean, advancing without a commit");
        }
        *stage = Stage::Committed;

        // 5. Push the branch
        self.vcs.push(&branch_name).await?;
        *stage = Stage::Pushed;
        tracing::info!(branch = %branch_name, "Branch pushed");

        // 6. Open the pull request
        let request = CreatePullRequest {
            title: templates::render_pr_title(&self.config.templates, &modification, prompt),
            body: templates::render_pr_body(&self.config.templates, &modification, prompt),
            head_branch: branch_name,
            base_branch: self.config.git.default_branch.clone(),
        };
        let pr = self.remote.create_pull_request(&request).await?;
        if let Some(url) = &pr.url {
            tracing::info!(url = %url, "Pull request ready");
        }
        state.record_pull_request(pr);
        *stage = Stage::RequestOpened;

        Ok(())
    }
}
