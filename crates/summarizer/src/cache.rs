use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;

/// Collision-resistant hash of the exact bytes submitted for summarization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    #[must_use]
    pub fn of(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        Self(format!("{:x}", hasher.finalize()))
    }

    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

/// Content-addressed summary cache shared across all jobs in the process.
///
/// Identical content always resolves to the same summary within the cache's
/// lifetime. Entries are never evicted here; retention is the surrounding
/// service's policy. Constructed explicitly and passed by reference, never a
/// process global.
#[derive(Debug, Default)]
pub struct SummaryCache {
    entries: RwLock<HashMap<Fingerprint, String>>,
}

impl SummaryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<String> {
        self.entries
            .read()
            .expect("summary cache lock poisoned")
            .get(fingerprint)
            .cloned()
    }

    /// Store `summary` unless the fingerprint already has one; returns the
    /// stored value. First writer wins, so two concurrent batches can never
    /// leave different summaries behind for the same content.
    pub fn insert_if_absent(&self, fingerprint: Fingerprint, summary: String) -> String {
        self.entries
            .write()
            .expect("summary cache lock poisoned")
            .entry(fingerprint)
            .or_insert(summary)
            .clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .expect("summary cache lock poisoned")
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
