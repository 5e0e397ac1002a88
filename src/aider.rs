use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::io::AsyncReadExt;

use crate::config::AiderConfig;
use crate::error::{AppError, Result};

/// Structured outcome of one aider invocation. Produced once, immutable
/// thereafter.
#[derive(Debug, Clone)]
pub struct ModificationResult {
    pub success: bool,
    pub modified_files: Vec<String>,
    pub summary: String,
    pub error_message: Option<String>,
    /// Combined stdout+stderr, kept verbatim for diagnostics.
    pub output: String,
}

impl ModificationResult {
    fn failure(message: String, output: String) -> Self {
        Self {
            success: false,
            modified_files: Vec::new(),
            summary: String::new(),
            error_message: Some(message),
            output,
        }
    }
}

/// The external code-modification step. All failure is returned in the
/// result, never raised past this boundary, so the orchestrator can always
/// produce a full run report.
#[async_trait]
pub trait Modifier: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<ModificationResult>;

    /// Cheap read-only probe used by the dependency validator.
    async fn probe(&self) -> bool;
}

/// Runs the `aider` binary in the working tree.
pub struct AiderRunner {
    config: AiderConfig,
    working_dir: PathBuf,
    binary: String,
}

impl AiderRunner {
    pub fn new(config: &AiderConfig, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            config: config.clone(),
            working_dir: working_dir.into(),
            binary: "aider".to_string(),
        }
    }

    #[cfg(test)]
    fn with_binary(mut self, binary: &str) -> Self {
        self.binary = binary.to_string();
        self
    }

    /// Assemble the full argument list: configured options, optional model,
    /// forced non-interactive mode, then the prompt.
    fn build_args(&self, prompt: &str) -> Vec<String> {
        let mut args: Vec<String> = self.config.options.clone();

        if let Some(model) = &self.config.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }

        if !args.iter().any(|a| a == "--yes" || a == "-y") {
            args.push("--yes".to_string());
        }

        args.push("--message".to_string());
        args.push(prompt.to_string());
        args
    }
}

#[async_trait]
impl Modifier for AiderRunner {
    async fn invoke(&self, prompt: &str) -> Result<ModificationResult> {
        if prompt.trim().is_empty() {
            return Err(AppError::AiderExecution(
                "Prompt must not be empty".to_string(),
            ));
        }

        let args = self.build_args(prompt);
        tracing::debug!(binary = %self.binary, ?args, "Invoking aider");

        let mut child = tokio::process::Command::new(&self.binary)
            .args(&args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AppError::AiderExecution(format!("Failed to spawn aider: {e}")))?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::Internal("aider stdout not captured".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| AppError::Internal("aider stderr not captured".to_string()))?;

        // Drain pipes concurrently so a chatty aider cannot deadlock on a
        // full pipe buffer while we wait for it to exit.
        let out_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stdout.read_to_end(&mut buf).await;
            buf
        });
        let err_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            buf
        });

        enum Wait {
            Exited(std::process::ExitStatus),
            Interrupted,
            TimedOut,
        }

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let waited = tokio::select! {
            status = child.wait() => Wait::Exited(
                status.map_err(|e| AppError::AiderExecution(format!("Failed to wait for aider: {e}")))?,
            ),
            _ = tokio::signal::ctrl_c() => Wait::Interrupted,
            _ = tokio::time::sleep(timeout) => Wait::TimedOut,
        };

        let status = match waited {
            Wait::Exited(status) => status,
            Wait::Interrupted => {
                let _ = child.kill().await;
                tracing::warn!("Interrupt received, aider terminated");
                return Err(AppError::Interrupted);
            }
            Wait::TimedOut => {
                let _ = child.kill().await;
                return Ok(ModificationResult::failure(
                    format!("Aider timed out after {} seconds", self.config.timeout_secs),
                    String::new(),
                ));
            }
        };

        let stdout = out_task
            .await
            .map_err(|e| AppError::Internal(format!("Output reader task panicked: {e}")))?;
        let stderr = err_task
            .await
            .map_err(|e| AppError::Internal(format!("Output reader task panicked: {e}")))?;

        let output = format!(
            "{}{}",
            String::from_utf8_lossy(&stdout),
            String::from_utf8_lossy(&stderr)
        );

        Ok(parse_output(status.code(), &output, prompt))
    }

    async fn probe(&self) -> bool {
        probe_binary(&self.binary).await
    }
}

/// Check that a tool responds to `--version` within a short deadline.
pub async fn probe_binary(binary: &str) -> bool {
    let run = tokio::process::Command::new(binary)
        .arg("--version")
        .stdin(Stdio::null())
        .output();
    match tokio::time::timeout(Duration::from_secs(10), run).await {
        Ok(Ok(output)) => output.status.success(),
        _ => false,
    }
}

/// Turn aider's free-text output into a `ModificationResult`. Best effort:
/// aider guarantees no structure, so absence of recognizable file lines with
/// a zero exit is still success with an empty file list.
fn parse_output(exit_code: Option<i32>, output: &str, prompt: &str) -> ModificationResult {
    match exit_code {
        Some(0) => {
            let modified_files = extract_modified_files(output);
            let summary = extract_summary(output, prompt, &modified_files);
            ModificationResult {
                success: true,
                modified_files,
                summary,
                error_message: None,
                output: output.to_string(),
            }
        }
        code => ModificationResult::failure(
            match code {
                Some(c) => format!("Aider exited with code {c}"),
                None => "Aider terminated by signal".to_string(),
            },
            output.to_string(),
        ),
    }
}

/// File extensions accepted by the loose checkmark pattern.
const KNOWN_EXTENSIONS: &str = "py|js|ts|rs|go|java|cpp|c|h|md|txt|json|yaml|yml|toml|xml|html|css";

fn extract_modified_files(output: &str) -> Vec<String> {
    let verb_pattern = Regex::new(r"(?im)^.*?(?:Modified|Created|Edited|Added|Updated):\s*(\S+)")
        .expect("static regex");
    let check_pattern = Regex::new(&format!(r"(?:✓|✔)\s*(\S+\.(?:{KNOWN_EXTENSIONS}))\b"))
        .expect("static regex");

    let mut files: Vec<String> = Vec::new();
    let mut push = |path: &str| {
        let path = path.trim_end_matches(|c: char| c == ',' || c == '.' || c == ';');
        if !path.is_empty() && !files.iter().any(|f| f == path) {
            files.push(path.to_string());
        }
    };

    for cap in verb_pattern.captures_iter(output) {
        push(&cap[1]);
    }
    for cap in check_pattern.captures_iter(output) {
        push(&cap[1]);
    }

    // Cap the list: beyond this the loose patterns are probably matching noise
    files.truncate(10);
    files
}

fn extract_summary(output: &str, prompt: &str, modified_files: &[String]) -> String {
    let summary_pattern =
        Regex::new(r"(?im)^(?:Summary|Changes made|Completed):\s*(.+)$").expect("static regex");
    if let Some(cap) = summary_pattern.captures(output) {
        return cap[1].trim().to_string();
    }

    if !modified_files.is_empty() {
        return format!(
            "Modified {} file(s): {}",
            modified_files.len(),
            modified_files.join(", ")
        );
    }

    let mut summary = prompt.chars().take(50).collect::<String>();
    if prompt.chars().count() > 50 {
        summary.push_str("...");
    }
    summary
}
