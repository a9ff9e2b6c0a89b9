use std::collections::HashMap;

/// Counters collected during one walk.
#[derive(Debug, Clone, Default)]
pub struct WalkStats {
    /// Files visited (one pending summarization item each).
    pub files: usize,

    /// Directories visited, including the root.
    pub directories: usize,

    /// Total size in bytes of visited files.
    pub total_bytes: u64,

    /// Files whose content was withheld (binary, oversized, or unreadable).
    pub skipped_content: usize,

    /// Per-language file counts.
    pub languages: HashMap<String, usize>,
}

impl WalkStats {
    pub(crate) fn add_file(&mut self, language: Option<&str>, size: u64) {
        self.files += 1;
        self.total_bytes += size;
        if let Some(language) = language {
            *self.languages.entry(language.to_string()).or_insert(0) += 1;
        }
    }

    /// Languages ordered by file count, most common first.
    #[must_use]
    pub fn dominant_languages(&self, limit: usize) -> Vec<String> {
        let mut counts: Vec<(&String, &usize)> = self.languages.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        counts
            .into_iter()
            .take(limit)
            .map(|(language, _)| language.clone())
            .collect()
    }
}
