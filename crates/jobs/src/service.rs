use crate::orchestrator::Analyzer;
use crate::registry::JobRegistry;
use crate::source::ProvideSource;
use atlas_protocol::{JobId, JobSnapshot, Node};
use atlas_summarizer::BatchDispatcher;
use atlas_walker::WalkerConfig;
use std::sync::Arc;
use tokio::sync::watch;

/// Transport-agnostic entry point: submit analyses and observe them.
///
/// The surrounding service wires this into whatever transport it speaks;
/// nothing here blocks on analysis work.
pub struct AtlasService {
    registry: Arc<JobRegistry>,
    analyzer: Analyzer,
}

impl AtlasService {
    #[must_use]
    pub fn new(dispatcher: Arc<BatchDispatcher>, provider: Arc<dyn ProvideSource>) -> Self {
        Self::with_walker_config(dispatcher, provider, WalkerConfig::from_env())
    }

    #[must_use]
    pub fn with_walker_config(
        dispatcher: Arc<BatchDispatcher>,
        provider: Arc<dyn ProvideSource>,
        walker_config: WalkerConfig,
    ) -> Self {
        let registry = Arc::new(JobRegistry::new());
        let analyzer = Analyzer::new(registry.clone(), dispatcher, provider, walker_config);
        Self { registry, analyzer }
    }

    /// Start analyzing `source`; returns the job id immediately.
    pub fn submit(&self, source: &str) -> JobId {
        self.analyzer.spawn(source)
    }

    #[must_use]
    pub fn status(&self, id: &JobId) -> Option<JobSnapshot> {
        self.registry.status(id)
    }

    #[must_use]
    pub fn tree(&self, id: &JobId) -> Option<Node> {
        self.registry.tree(id)
    }

    #[must_use]
    pub fn subscribe(&self, id: &JobId) -> Option<watch::Receiver<JobSnapshot>> {
        self.registry.subscribe(id)
    }

    /// Await the single terminal snapshot of a job (with tree when
    /// completed). `None` for unknown or evicted jobs.
    pub async fn wait_terminal(&self, id: &JobId) -> Option<JobSnapshot> {
        let mut rx = self.subscribe(id)?;
        loop {
            let snapshot = rx.borrow().clone();
            if snapshot.state.is_terminal() {
                return Some(snapshot);
            }
            if rx.changed().await.is_err() {
                return None;
            }
        }
    }

    /// The underlying registry, for eviction and observability.
    #[must_use]
    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }
}
