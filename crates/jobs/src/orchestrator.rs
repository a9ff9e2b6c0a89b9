use crate::error::{JobsError, Result};
use crate::registry::{JobRegistry, JobUpdate};
use crate::source::ProvideSource;
use atlas_protocol::{JobId, JobState, Node, NodeKind};
use atlas_summarizer::{annotate_directories, BatchDispatcher, DispatchProgress};
use atlas_walker::{TreeWalker, Walk, WalkerConfig};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

// Fixed milestone schedule; batch completions advance progress inside the
// analyzing span.
const PROGRESS_INITIALIZING: f32 = 0.05;
const PROGRESS_SCANNING: f32 = 0.15;
const PROGRESS_ANALYZING: f32 = 0.30;
const ANALYZING_SPAN: f32 = 0.55;
const PROGRESS_FINALIZING: f32 = 0.95;

/// Drives one analysis job end to end: resolve the source, walk the tree,
/// dispatch summaries, bind them, and record the terminal state. Every
/// registry mutation for a job goes through its orchestrator task.
pub struct Analyzer {
    registry: Arc<JobRegistry>,
    dispatcher: Arc<BatchDispatcher>,
    provider: Arc<dyn ProvideSource>,
    walker_config: WalkerConfig,
}

impl Analyzer {
    #[must_use]
    pub fn new(
        registry: Arc<JobRegistry>,
        dispatcher: Arc<BatchDispatcher>,
        provider: Arc<dyn ProvideSource>,
        walker_config: WalkerConfig,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            provider,
            walker_config,
        }
    }

    /// Register a job and start its background run; returns immediately with
    /// the id. The run ends in `completed` or `failed`, never a silent hang.
    pub fn spawn(&self, source: &str) -> JobId {
        let job_id = self.registry.create(source);

        let registry = self.registry.clone();
        let dispatcher = self.dispatcher.clone();
        let provider = self.provider.clone();
        let walker_config = self.walker_config;
        let source = source.to_string();
        let id = job_id.clone();

        tokio::spawn(async move {
            match run_analysis(&registry, &dispatcher, provider, walker_config, &id, &source)
                .await
            {
                Ok(tree) => {
                    registry.update(&id, JobUpdate::completed(tree));
                    log::info!("analysis job {id} completed");
                }
                Err(err) => {
                    log::warn!("analysis job {id} failed: {err}");
                    registry.update(&id, JobUpdate::failed(err.to_string()));
                }
            }
        });

        job_id
    }
}

async fn run_analysis(
    registry: &Arc<JobRegistry>,
    dispatcher: &BatchDispatcher,
    provider: Arc<dyn ProvideSource>,
    walker_config: WalkerConfig,
    id: &JobId,
    source: &str,
) -> Result<Node> {
    // Source resolution happens while the job is still queued: an invalid or
    // unfetchable source fails the job without it ever reaching running.
    let root = provider.materialize(source).await?;

    registry.update(
        id,
        JobUpdate::milestone(PROGRESS_INITIALIZING, "initializing", "source resolved")
            .state(JobState::Running),
    );

    registry.update(
        id,
        JobUpdate::milestone(
            PROGRESS_SCANNING,
            "scanning",
            format!("walking {}", root.display()),
        ),
    );
    let walker = TreeWalker::new(walker_config);
    let walk_root = root.clone();
    let walk = tokio::task::spawn_blocking(move || walker.walk(&walk_root))
        .await
        .map_err(|err| JobsError::Other(format!("walker task failed: {err}")))??;

    let ctx = walk.repo_context(repo_name(&root, source));
    let Walk { root: mut tree, pending, .. } = walk;

    registry.update(
        id,
        JobUpdate::milestone(
            PROGRESS_ANALYZING,
            "analyzing",
            format!("summarizing {} files", pending.len()),
        ),
    );

    // Batch completions stream back as messages; the forwarder owns all
    // progress writes for the analyzing span.
    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<DispatchProgress>();
    let forward_registry = registry.clone();
    let forward_id = id.clone();
    let forwarder = tokio::spawn(async move {
        while let Some(progress) = progress_rx.recv().await {
            let frac = if progress.total == 0 {
                1.0
            } else {
                progress.completed as f32 / progress.total as f32
            };
            forward_registry.update(
                &forward_id,
                JobUpdate::milestone(
                    PROGRESS_ANALYZING + ANALYZING_SPAN * frac,
                    "analyzing",
                    format!(
                        "summarized batch {}/{}",
                        progress.completed, progress.total
                    ),
                ),
            );
        }
    });

    let summaries = dispatcher
        .summarize_all_with_progress(&pending, &ctx, Some(progress_tx))
        .await;
    let _ = forwarder.await;

    bind_file_summaries(&mut tree, &summaries);

    registry.update(
        id,
        JobUpdate::milestone(
            PROGRESS_FINALIZING,
            "finalizing",
            "building directory summaries",
        ),
    );
    annotate_directories(&mut tree);
    debug_assert!(tree.is_fully_summarized());

    Ok(tree)
}

fn repo_name(root: &Path, source: &str) -> String {
    root.file_name()
        .map_or_else(|| source.to_string(), |name| name.to_string_lossy().into_owned())
}

fn bind_file_summaries(node: &mut Node, summaries: &HashMap<String, String>) {
    match node.kind {
        NodeKind::File => node.summary = summaries.get(&node.path).cloned(),
        NodeKind::Directory => {
            for child in &mut node.children {
                bind_file_summaries(child, summaries);
            }
        }
    }
}
