//! # Atlas Summarizer
//!
//! Content-addressed caching and batched dispatch of summarization work.
//!
//! ## Pipeline
//!
//! ```text
//! Pending files
//!     │
//!     ├──> Fingerprint + cache lookup (duplicates collapse)
//!     │
//!     ├──> Size-bounded batches ──> external service (bounded concurrency,
//!     │                             hard timeout)
//!     │
//!     └──> Local fallback for every remaining miss
//!            └─> one summary per input path, cache updated
//! ```
//!
//! Directory summaries are a separate deterministic pass
//! ([`annotate_directories`]) that runs after all file summaries are bound
//! and never touches the external service.

mod batch;
mod cache;
mod directory;
mod error;
mod fallback;
mod gemini;

pub use batch::{BatchDispatcher, DispatchProgress, DispatcherConfig};
pub use cache::{Fingerprint, SummaryCache};
pub use directory::annotate_directories;
pub use error::{Result, SummarizerError};
pub use fallback::naive_summary;
pub use gemini::GeminiSummarizer;

use async_trait::async_trait;
use atlas_protocol::{PendingFile, RepoContext};
use std::collections::HashMap;

/// Boundary to the external summarization collaborator.
///
/// Implementations receive one size-bounded batch and return a best-effort
/// mapping from item path to summary; missing entries and errors of any kind
/// are recovered by the caller through the local fallback.
#[async_trait]
pub trait Summarize: Send + Sync {
    async fn summarize_batch(
        &self,
        items: &[PendingFile],
        ctx: &RepoContext,
    ) -> Result<HashMap<String, String>>;
}
