//! # Atlas Walker
//!
//! Deterministic directory traversal for analysis jobs.
//!
//! ## Pipeline
//!
//! ```text
//! Root directory
//!     │
//!     ├──> Ignore policy (fixed set + hidden dirs)
//!     │
//!     └──> Depth-first walk (lexicographic children)
//!            ├─> Node skeleton (no summaries yet)
//!            └─> Pending summarization items
//! ```

mod error;
mod policy;
mod stats;
mod walker;

pub use error::{Result, WalkerError};
pub use policy::{is_binary_ext, should_prune_dir};
pub use stats::WalkStats;
pub use walker::{TreeWalker, Walk, WalkerConfig};
