use crate::error::{Result, WalkerError};
use crate::policy::{is_binary_ext, should_prune_dir};
use crate::stats::WalkStats;
use atlas_protocol::{detect_language, Node, NodeKind, PendingFile, RepoContext};
use std::fs;
use std::path::Path;

const DEFAULT_MAX_FILE_BYTES: u64 = 200_000;

#[derive(Debug, Clone, Copy)]
pub struct WalkerConfig {
    /// Files larger than this are recorded with empty content and summarized
    /// from their name alone.
    pub max_file_bytes: u64,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

impl WalkerConfig {
    /// Read overrides from the environment, clamped to sane bounds.
    #[must_use]
    pub fn from_env() -> Self {
        let max_file_bytes = std::env::var("ATLAS_MAX_FILE_BYTES")
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_MAX_FILE_BYTES)
            .clamp(1_024, 10 * 1024 * 1024);
        Self { max_file_bytes }
    }
}

/// Output of one traversal: the unsummarized tree skeleton plus every file's
/// content queued for summarization.
#[derive(Debug)]
pub struct Walk {
    pub root: Node,
    pub pending: Vec<PendingFile>,
    pub stats: WalkStats,
}

impl Walk {
    /// Repository-level context derived from the walk, forwarded with every
    /// summarization batch.
    #[must_use]
    pub fn repo_context(&self, repo_name: impl Into<String>) -> RepoContext {
        RepoContext {
            repo_name: repo_name.into(),
            languages: self.stats.dominant_languages(5),
            top_dirs: self
                .root
                .children
                .iter()
                .filter(|child| child.kind == NodeKind::Directory)
                .map(|child| child.name.clone())
                .collect(),
        }
    }
}

/// Recursive directory walker producing the node skeleton for one job.
///
/// Traversal is depth-first with children ordered lexicographically by name,
/// so repeated runs against an unchanged tree are structurally identical.
pub struct TreeWalker {
    config: WalkerConfig,
}

impl TreeWalker {
    #[must_use]
    pub fn new(config: WalkerConfig) -> Self {
        Self { config }
    }

    /// Walk `root`, returning the tree skeleton and pending summarization
    /// items. The only whole-walk failure is a root that is not an existing
    /// directory; unreadable entries inside the tree degrade to placeholders.
    pub fn walk(&self, root: &Path) -> Result<Walk> {
        let meta =
            fs::metadata(root).map_err(|_| WalkerError::InvalidRoot(root.to_path_buf()))?;
        if !meta.is_dir() {
            return Err(WalkerError::InvalidRoot(root.to_path_buf()));
        }

        let name = root
            .file_name()
            .map_or_else(|| ".".to_string(), |n| n.to_string_lossy().into_owned());

        let mut pending = Vec::new();
        let mut stats = WalkStats::default();
        let root_node = self.walk_dir(root, ".", &name, &mut pending, &mut stats)?;

        log::info!(
            "walked {}: {} files, {} directories",
            root.display(),
            stats.files,
            stats.directories
        );

        Ok(Walk {
            root: root_node,
            pending,
            stats,
        })
    }

    fn walk_dir(
        &self,
        dir: &Path,
        rel: &str,
        name: &str,
        pending: &mut Vec<PendingFile>,
        stats: &mut WalkStats,
    ) -> Result<Node> {
        stats.directories += 1;

        let mut entries: Vec<fs::DirEntry> = fs::read_dir(dir)?.filter_map(|e| e.ok()).collect();
        entries.sort_by_key(fs::DirEntry::file_name);

        let mut children = Vec::new();
        for entry in entries {
            let entry_name = entry.file_name().to_string_lossy().into_owned();
            let entry_path = entry.path();
            let child_rel = if rel == "." {
                entry_name.clone()
            } else {
                format!("{rel}/{entry_name}")
            };

            let Ok(file_type) = entry.file_type() else {
                log::debug!("skipping unreadable entry {}", entry_path.display());
                continue;
            };
            if file_type.is_symlink() {
                log::debug!("skipping symlink {}", entry_path.display());
                continue;
            }

            if file_type.is_dir() {
                if should_prune_dir(&entry_name) {
                    continue;
                }
                match self.walk_dir(&entry_path, &child_rel, &entry_name, pending, stats) {
                    Ok(node) => children.push(node),
                    Err(err) => {
                        // An unreadable subdirectory degrades to an empty
                        // placeholder; only a missing root is fatal.
                        log::debug!("unreadable directory {}: {err}", entry_path.display());
                        children.push(Node::directory(child_rel, entry_name, Vec::new()));
                    }
                }
            } else {
                children.push(self.file_node(&entry_path, child_rel, entry_name, pending, stats));
            }
        }

        Ok(Node::directory(rel.to_string(), name.to_string(), children))
    }

    fn file_node(
        &self,
        path: &Path,
        rel: String,
        name: String,
        pending: &mut Vec<PendingFile>,
        stats: &mut WalkStats,
    ) -> Node {
        let size = fs::metadata(path).map_or(0, |meta| meta.len());
        let language = detect_language(path);

        let content = if size > self.config.max_file_bytes || is_binary_ext(path) {
            stats.skipped_content += 1;
            String::new()
        } else {
            match fs::read(path) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(err) => {
                    log::debug!("unreadable file {}: {err}", path.display());
                    stats.skipped_content += 1;
                    String::new()
                }
            }
        };

        stats.add_file(language, size);
        pending.push(PendingFile {
            path: rel.clone(),
            content,
            language: language.map(str::to_string),
            size,
        });

        Node::file(rel, name, language.map(str::to_string), size)
    }
}
