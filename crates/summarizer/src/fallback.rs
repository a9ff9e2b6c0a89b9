//! Deterministic local summaries used whenever the external service cannot
//! supply one: unreachable, timed out, or silent about an item.

/// Filename keywords checked in order; first match wins.
const ROLE_KEYWORDS: &[(&str, &str)] = &[
    ("test", "test file"),
    ("spec", "test/spec file"),
    ("config", "configuration file"),
    ("readme", "documentation"),
    ("dockerfile", "container build config"),
    ("makefile", "build automation"),
    ("license", "license text"),
];

const FIRST_LINE_MAX_CHARS: usize = 140;

/// Heuristic summary from the filename, the first non-blank content line, or
/// the detected language. Total and deterministic.
#[must_use]
pub fn naive_summary(path: &str, content: &str, language: Option<&str>) -> String {
    let name = path.rsplit('/').next().unwrap_or(path).to_lowercase();
    for (keyword, role) in ROLE_KEYWORDS {
        if name.contains(keyword) {
            return format!("Likely {role} for the project.");
        }
    }

    if let Some(first) = content.lines().map(str::trim).find(|line| !line.is_empty()) {
        let snippet: String = first.chars().take(FIRST_LINE_MAX_CHARS).collect();
        return format!("Appears to define or configure: {snippet}");
    }

    if let Some(language) = language {
        return format!("{language} source file.");
    }

    "Project asset or metadata.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn role_keywords_beat_content() {
        assert_eq!(
            naive_summary("tests/test_walker.py", "import os", Some("python")),
            "Likely test file for the project."
        );
        assert_eq!(
            naive_summary("README.md", "# Project", None),
            "Likely documentation for the project."
        );
        assert_eq!(
            naive_summary("deploy/Dockerfile", "FROM alpine", None),
            "Likely container build config for the project."
        );
    }

    #[test]
    fn first_non_blank_line_is_quoted() {
        let summary = naive_summary("src/main.rs", "\n\n  fn main() {}\n", Some("rust"));
        assert_eq!(summary, "Appears to define or configure: fn main() {}");
    }

    #[test]
    fn long_first_line_is_truncated_on_char_boundary() {
        let line = "é".repeat(300);
        let summary = naive_summary("notes.txt", &line, None);
        assert!(summary.ends_with(&"é".repeat(10)));
        assert_eq!(
            summary.chars().count(),
            "Appears to define or configure: ".chars().count() + FIRST_LINE_MAX_CHARS
        );
    }

    #[test]
    fn empty_content_falls_through_to_language_then_generic() {
        assert_eq!(
            naive_summary("src/lib.rs", "", Some("rust")),
            "rust source file."
        );
        assert_eq!(naive_summary("logo.png", "", None), "Project asset or metadata.");
    }
}
