//! # Atlas Protocol
//!
//! Shared data model for repository analysis: the annotated node tree, job
//! lifecycle types, and the transient items exchanged between the tree walker
//! and the summary dispatcher.

mod language;

pub use language::detect_language;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for one tracked analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of an analysis job.
///
/// `Completed` and `Failed` are absorbing: once reached, the job never
/// changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Whether a node is a file or a directory.
///
/// The canonical wire labels are exactly `"file"` and `"directory"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// One entry in the annotated tree produced by an analysis run.
///
/// The tree is a strict rooted tree: built once per job, immutable once the
/// job completes. `path` is unique within a job and uses `/` separators
/// relative to the analyzed root (the root itself is `"."`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub path: String,
    pub name: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    #[must_use]
    pub fn file(
        path: impl Into<String>,
        name: impl Into<String>,
        language: Option<String>,
        size: u64,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            kind: NodeKind::File,
            language,
            size: Some(size),
            summary: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn directory(path: impl Into<String>, name: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            kind: NodeKind::Directory,
            language: None,
            size: None,
            summary: None,
            children,
        }
    }

    /// True when every node in the subtree carries a summary.
    #[must_use]
    pub fn is_fully_summarized(&self) -> bool {
        self.summary.is_some() && self.children.iter().all(Node::is_fully_summarized)
    }

    /// Number of file nodes in the subtree.
    #[must_use]
    pub fn file_count(&self) -> usize {
        match self.kind {
            NodeKind::File => 1,
            NodeKind::Directory => self.children.iter().map(Node::file_count).sum(),
        }
    }
}

/// Atomic view of a job handed to status observers.
///
/// `tree` is populated only on the terminal snapshot of a completed job;
/// polling reads keep it empty so they stay cheap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub state: JobState,
    pub progress: f32,
    pub phase: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree: Option<Node>,
}

/// Transient summarization request produced by the walker and consumed by the
/// batch dispatcher; discarded after a summary is bound to its node.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFile {
    pub path: String,
    pub content: String,
    pub language: Option<String>,
    pub size: u64,
}

/// Repository-level context forwarded with every summarization batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoContext {
    pub repo_name: String,
    /// Dominant languages, most common first.
    pub languages: Vec<String>,
    /// Top-level directory names under the analyzed root.
    pub top_dirs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn job_ids_are_unique() {
        assert_ne!(JobId::new(), JobId::new());
    }

    #[test]
    fn terminal_states() {
        assert!(!JobState::Queued.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
    }

    #[test]
    fn node_kind_uses_canonical_labels() {
        assert_eq!(
            serde_json::to_string(&NodeKind::File).unwrap(),
            "\"file\""
        );
        assert_eq!(
            serde_json::to_string(&NodeKind::Directory).unwrap(),
            "\"directory\""
        );
    }

    #[test]
    fn file_node_serializes_without_children() {
        let node = Node::file("src/main.rs", "main.rs", Some("rust".into()), 42);
        let json = serde_json::to_value(&node).unwrap();
        assert!(json.get("children").is_none());
        assert_eq!(json["kind"], "file");
        assert_eq!(json["size"], 42);
    }

    #[test]
    fn fully_summarized_requires_every_node() {
        let mut leaf = Node::file("a.rs", "a.rs", Some("rust".into()), 1);
        let mut root = Node::directory(".", "repo", vec![leaf.clone()]);
        assert!(!root.is_fully_summarized());

        leaf.summary = Some("A file.".into());
        root.children = vec![leaf];
        assert!(!root.is_fully_summarized());

        root.summary = Some("A directory.".into());
        assert!(root.is_fully_summarized());
        assert_eq!(root.file_count(), 1);
    }
}
