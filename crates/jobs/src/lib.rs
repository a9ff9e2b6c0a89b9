//! # Atlas Jobs
//!
//! Job registry, analysis orchestration, and the status observer protocol.
//!
//! ## Pipeline
//!
//! ```text
//! submit(source)
//!     │
//!     ├──> Job Registry (queued, per-job lock, watch channel)
//!     │
//!     └──> background task
//!            ├─> source provider ─> local root
//!            ├─> tree walker ─> skeleton + pending files
//!            ├─> batch dispatcher ─> summaries (cache + fallback)
//!            └─> terminal update (completed tree | failure message)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use atlas_jobs::{AtlasService, LocalPath};
//! use atlas_summarizer::{BatchDispatcher, DispatcherConfig, SummaryCache};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let cache = Arc::new(SummaryCache::new());
//!     let dispatcher = Arc::new(BatchDispatcher::local_only(
//!         cache,
//!         DispatcherConfig::from_env(),
//!     ));
//!     let service = AtlasService::new(dispatcher, Arc::new(LocalPath));
//!
//!     let id = service.submit("/path/to/repo");
//!     if let Some(terminal) = service.wait_terminal(&id).await {
//!         println!("{:?}: {}", terminal.state, terminal.message);
//!     }
//! }
//! ```

mod error;
mod orchestrator;
mod registry;
mod service;
mod source;

pub use error::{JobsError, Result};
pub use orchestrator::Analyzer;
pub use registry::{JobRegistry, JobUpdate};
pub use service::AtlasService;
pub use source::{LocalPath, ProvideSource};
