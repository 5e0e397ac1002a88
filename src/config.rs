use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub github: GitHubConfig,
    #[serde(default)]
    pub aider: AiderConfig,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub templates: TemplateConfig,
}

#[derive(Deserialize, Clone)]
pub struct GitHubConfig {
    pub token: String,
    /// Target repository as `owner/name`.
    pub repo: String,
}

// Manual Debug impl to avoid leaking the token
impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &"[REDACTED]")
            .field("repo", &self.repo)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AiderConfig {
    #[serde(default)]
    pub options: Vec<String>,
    pub model: Option<String>,
    #[serde(default = "default_aider_timeout")]
    pub timeout_secs: u64,
}

impl Default for AiderConfig {
    fn default() -> Self {
        Self {
            options: Vec::new(),
            model: None,
            timeout_secs: default_aider_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GitConfig {
    #[serde(default = "default_branch")]
    pub default_branch: String,
    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TemplateConfig {
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
    #[serde(default = "default_pr_title")]
    pub pr_title: String,
    #[serde(default = "default_pr_body")]
    pub pr_body: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            default_branch: default_branch(),
            branch_prefix: default_branch_prefix(),
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            commit_message: default_commit_message(),
            pr_title: default_pr_title(),
            pr_body: default_pr_body(),
        }
    }
}

fn default_aider_timeout() -> u64 {
    300
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_branch_prefix() -> String {
    "aiderflow/".to_string()
}

fn default_commit_message() -> String {
    "feat: {summary}".to_string()
}

fn default_pr_title() -> String {
    "AI-generated changes: {summary}".to_string()
}

fn default_pr_body() -> String {
    "## Automated changes\n\n**Prompt:** {prompt}\n\n**Modified files:**\n{modified_files}\n\n**Aider summary:**\n{aider_summary}\n"
        .to_string()
}

/// Starter config written by `--init`. The token is left as an environment
/// placeholder so the file can be committed without leaking a secret.
const STARTER_CONFIG: &str = r#"[github]
token = "${GITHUB_TOKEN}"
repo = "owner/repository-name"

[aider]
options = ["--no-pretty"]
# model = "gpt-4"

[git]
default_branch = "main"
branch_prefix = "aiderflow/"

[templates]
commit_message = "feat: {summary}"
pr_title = "AI-generated changes: {summary}"
pr_body = """
## Automated changes

**Prompt:** {prompt}

**Modified files:**
{modified_files}

**Aider summary:**
{aider_summary}
"""
"#;

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Load from file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            // Try default paths (aiderflow.toml / aiderflow.json / ...)
            builder = builder.add_source(config::File::with_name("aiderflow").required(false));
        }

        // Environment variable overrides with AIDERFLOW_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("AIDERFLOW")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        let mut config: AppConfig = config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config.github.token = expand_env_placeholder(&config.github.token)?;
        if !config.git.branch_prefix.is_empty() && !config.git.branch_prefix.ends_with('/') {
            config.git.branch_prefix.push('/');
        }

        config.validate()?;
        Ok(config)
    }

    /// Validation happens at load time, before any workflow step runs.
    pub fn validate(&self) -> Result<()> {
        if self.github.token.trim().is_empty() {
            return Err(AppError::Config(
                "github.token must not be empty".to_string(),
            ));
        }
        self.repo_owner_name()?;
        Ok(())
    }

    /// Split `github.repo` into `(owner, name)`.
    pub fn repo_owner_name(&self) -> Result<(&str, &str)> {
        let parts: Vec<&str> = self.github.repo.splitn(2, '/').collect();
        match parts.as_slice() {
            [owner, name] if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok((owner, name))
            }
            _ => Err(AppError::Config(format!(
                "github.repo must be in owner/name form, got: {}",
                self.github.repo
            ))),
        }
    }

    /// Write the starter config file for `--init`.
    pub fn write_starter(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(AppError::Config(format!(
                "config file already exists: {} (use --force to overwrite)",
                path.display()
            )));
        }
        std::fs::write(path, STARTER_CONFIG)?;
        Ok(())
    }
}

/// Resolve `${VAR}` placeholders against the process environment.
fn expand_env_placeholder(value: &str) -> Result<String> {
    if let Some(rest) = value.strip_prefix("${") {
        if let Some(var) = rest.strip_suffix('}') {
            return std::env::var(var).map_err(|_| {
                AppError::Config(format!("environment variable {var} is not set"))
            });
        }
    }
    Ok(value.to_string())
}
