//! Placeholder rendering for the commit-message, PR-title, and PR-body
//! templates. Substitution is literal string replacement; unknown
//! placeholders are left untouched.

use crate::aider::ModificationResult;
use crate::config::TemplateConfig;

const MAX_TITLE_LEN: usize = 100;
const MAX_SUMMARY_LEN: usize = 50;

pub fn render_commit_message(templates: &TemplateConfig, modification: &ModificationResult, prompt: &str) -> String {
    let summary = summary_slot(modification, prompt);
    templates.commit_message.replace("{summary}", &summary)
}

pub fn render_pr_title(
    templates: &TemplateConfig,
    modification: &ModificationResult,
    prompt: &str,
) -> String {
    let summary = summary_slot(modification, prompt);
    let title = templates
        .pr_title
        .replace("{summary}", &summary)
        .replace("{prompt}", prompt);
    clamp(&title, MAX_TITLE_LEN)
}

pub fn render_pr_body(
    templates: &TemplateConfig,
    modification: &ModificationResult,
    prompt: &str,
) -> String {
    let modified_files = if modification.modified_files.is_empty() {
        "(no file list reported)".to_string()
    } else {
        modification
            .modified_files
            .iter()
            .map(|f| format!("- {f}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let aider_summary = if modification.summary.is_empty() {
        "(no summary reported)"
    } else {
        &modification.summary
    };

    templates
        .pr_body
        .replace("{prompt}", prompt)
        .replace("{modified_files}", &modified_files)
        .replace("{aider_summary}", aider_summary)
}

/// Value for the `{summary}` slot: the aider summary when present, else the
/// prompt, clamped so titles stay readable.
fn summary_slot(modification: &ModificationResult, prompt: &str) -> String {
    let base = if modification.summary.is_empty() {
        prompt
    } else {
        &modification.summary
    };
    clamp(base, MAX_SUMMARY_LEN)
}

fn clamp(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modification(summary: &str, files: &[&str]) -> ModificationResult {
        ModificationResult {
            success: true,
            modified_files: files.iter().map(|s| s.to_string()).collect(),
            summary: summary.to_string(),
            error_message: None,
            output: String::new(),
        }
    }

    fn templates() -> TemplateConfig {
        TemplateConfig::default()
    }

    #[test]
    fn test_commit_message_uses_summary() {
        let m = modification("updated background color", &["index.html"]);
        let msg = render_commit_message(&templates(), &m, "change background color");
        assert_eq!(msg, "feat: updated background color");
    }

    #[test]
    fn test_commit_message_falls_back_to_prompt() {
        let m = modification("", &[]);
        let msg = render_commit_message(&templates(), &m, "change background color");
        assert_eq!(msg, "feat: change background color");
    }

    #[test]
    fn test_pr_title_is_clamped() {
        let mut t = templates();
        t.pr_title = "{prompt}".to_string();
        let long_prompt = "p".repeat(150);
        let title = render_pr_title(&t, &modification("s", &[]), &long_prompt);
        assert_eq!(title.chars().count(), 100);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_pr_body_lists_files() {
        let m = modification("updated things", &["index.html", "style.css"]);
        let body = render_pr_body(&templates(), &m, "change background color");
        assert!(body.contains("**Prompt:** change background color"));
        assert!(body.contains("- index.html\n- style.css"));
        assert!(body.contains("updated things"));
    }

    #[test]
    fn test_pr_body_without_file_list() {
        let m = modification("", &[]);
        let body = render_pr_body(&templates(), &m, "prompt");
        assert!(body.contains("(no file list reported)"));
        assert!(body.contains("(no summary reported)"));
    }

    #[test]
    fn test_unknown_placeholders_left_alone() {
        let mut t = templates();
        t.pr_body = "{prompt} {unknown}".to_string();
        let body = render_pr_body(&t, &modification("s", &[]), "p");
        assert_eq!(body, "p {unknown}");
    }
}
