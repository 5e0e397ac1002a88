use chrono::{DateTime, Utc};

/// Words too generic to carry into a branch name.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is",
    "are", "was", "were", "be", "been", "have", "has", "had", "do", "does", "did", "will", "would",
    "could", "should", "may", "might", "can", "must", "shall", "this", "that", "these", "those",
];

/// Derive a branch name from the prompt: keyword slug plus a timestamp for
/// uniqueness, under the configured prefix.
pub fn generate(prompt: &str, prefix: &str, now: DateTime<Utc>) -> String {
    let slug = slug_from_prompt(prompt);
    let timestamp = now.format("%Y%m%d-%H%M%S");
    format!("{prefix}{slug}-{timestamp}")
}

fn slug_from_prompt(prompt: &str) -> String {
    let words: Vec<String> = prompt
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2 && !STOP_WORDS.contains(w))
        .take(5)
        .map(str::to_string)
        .collect();

    if words.is_empty() {
        return "feature".to_string();
    }

    let mut slug = words.join("-");
    if slug.len() > 50 {
        slug.truncate(50);
    }
    sanitize(&slug)
}

/// Clean a user-supplied or derived name into a legal git ref component:
/// no spaces or ref-special characters, no leading/trailing separators,
/// no consecutive dashes.
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() || c == '-' || c == '_' || c == '/' || c == '.' {
            out.push(c);
        } else {
            out.push('-');
        }
    }

    // Collapse runs of dashes
    while out.contains("--") {
        out = out.replace("--", "-");
    }
    // `..` is illegal in refs
    while out.contains("..") {
        out = out.replace("..", ".");
    }

    let trimmed = out.trim_matches(|c| c == '-' || c == '.' || c == '_' || c == '/');
    if trimmed.is_empty() {
        "feature".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn test_generate_is_deterministic_for_fixed_time() {
        let a = generate("change background color", "aiderflow/", fixed_now());
        let b = generate("change background color", "aiderflow/", fixed_now());
        assert_eq!(a, b);
        assert_eq!(a, "aiderflow/change-background-color-20250314-092653");
    }

    #[test]
    fn test_generate_filters_stop_words() {
        let name = generate("fix the bug in the login for the users", "p/", fixed_now());
        assert_eq!(name, "p/fix-bug-login-users-20250314-092653");
    }

    #[test]
    fn test_generate_empty_prompt_falls_back() {
        let name = generate("a the of", "aiderflow/", fixed_now());
        assert!(name.starts_with("aiderflow/feature-"));
    }

    #[test]
    fn test_sanitize_strips_illegal_characters() {
        assert_eq!(sanitize("fix login bug!"), "fix-login-bug");
        assert_eq!(sanitize("what?*["), "what");
        assert_eq!(sanitize("a  b"), "a-b");
    }

    #[test]
    fn test_sanitize_trims_separators() {
        assert_eq!(sanitize("-leading-dash"), "leading-dash");
        assert_eq!(sanitize(".hidden"), "hidden");
        assert_eq!(sanitize("trailing/"), "trailing");
    }

    #[test]
    fn test_sanitize_collapses_double_dots() {
        assert_eq!(sanitize("a..b"), "a.b");
    }

    #[test]
    fn test_sanitize_empty_falls_back() {
        assert_eq!(sanitize("!!!"), "feature");
        assert_eq!(sanitize(""), "feature");
    }

    #[test]
    fn test_long_prompt_is_capped() {
        let prompt = "implement comprehensive authentication authorization \
                      session management password reset email verification";
        let name = generate(prompt, "aiderflow/", fixed_now());
        let slug = name
            .strip_prefix("aiderflow/")
            .unwrap()
            .strip_suffix("-20250314-092653")
            .unwrap();
        assert!(slug.len() <= 50);
    }
}
