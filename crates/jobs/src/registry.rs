use atlas_protocol::{JobId, JobSnapshot, JobState, Node};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::watch;

/// Partial mutation of one job. Only the fields that are set are applied;
/// application is atomic under the job's lock.
#[derive(Debug, Default, Clone)]
pub struct JobUpdate {
    pub state: Option<JobState>,
    pub progress: Option<f32>,
    pub phase: Option<String>,
    pub message: Option<String>,
    pub tree: Option<Node>,
}

impl JobUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(mut self, state: JobState) -> Self {
        self.state = Some(state);
        self
    }

    #[must_use]
    pub fn progress(mut self, progress: f32) -> Self {
        self.progress = Some(progress);
        self
    }

    #[must_use]
    pub fn phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn tree(mut self, tree: Node) -> Self {
        self.tree = Some(tree);
        self
    }

    #[must_use]
    pub fn milestone(progress: f32, phase: &str, message: impl Into<String>) -> Self {
        Self {
            progress: Some(progress),
            phase: Some(phase.to_string()),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn completed(tree: Node) -> Self {
        Self {
            state: Some(JobState::Completed),
            progress: Some(1.0),
            phase: Some("completed".to_string()),
            message: Some("analysis complete".to_string()),
            tree: Some(tree),
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            state: Some(JobState::Failed),
            progress: Some(1.0),
            phase: Some("failed".to_string()),
            message: Some(message.into()),
            tree: None,
        }
    }
}

#[derive(Debug)]
struct JobRecord {
    source: String,
    state: JobState,
    progress: f32,
    phase: String,
    message: String,
    tree: Option<Node>,
}

impl JobRecord {
    fn snapshot(&self, id: &JobId, include_tree: bool) -> JobSnapshot {
        JobSnapshot {
            job_id: id.clone(),
            state: self.state,
            progress: self.progress,
            phase: self.phase.clone(),
            message: self.message.clone(),
            tree: if include_tree { self.tree.clone() } else { None },
        }
    }
}

struct JobHandle {
    record: Mutex<JobRecord>,
    snapshot_tx: watch::Sender<JobSnapshot>,
}

/// Owns every in-flight and finished analysis job.
///
/// Mutation and snapshot reads of the same job are mutually exclusive under a
/// per-job lock; the registry map itself is only locked long enough to look a
/// job up, so status polls never wait on analysis work. Constructed
/// explicitly and shared by `Arc`, never a process global.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, Arc<JobHandle>>>,
}

impl JobRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job in `queued` state and return its id.
    pub fn create(&self, source: &str) -> JobId {
        let id = JobId::new();
        let record = JobRecord {
            source: source.to_string(),
            state: JobState::Queued,
            progress: 0.0,
            phase: "queued".to_string(),
            message: format!("queued analysis of {source}"),
            tree: None,
        };
        let (snapshot_tx, _) = watch::channel(record.snapshot(&id, false));
        let handle = Arc::new(JobHandle {
            record: Mutex::new(record),
            snapshot_tx,
        });
        self.jobs
            .write()
            .expect("job registry lock poisoned")
            .insert(id.clone(), handle);
        id
    }

    fn handle(&self, id: &JobId) -> Option<Arc<JobHandle>> {
        self.jobs
            .read()
            .expect("job registry lock poisoned")
            .get(id)
            .cloned()
    }

    /// Apply `update` to the job. Unknown ids are a silent no-op. Terminal
    /// jobs absorb every further update; progress never decreases and is
    /// forced to exactly 1.0 on a terminal transition. Observers are notified
    /// only when the visible snapshot actually changed.
    pub fn update(&self, id: &JobId, update: JobUpdate) {
        let Some(handle) = self.handle(id) else {
            return;
        };

        let snapshot = {
            let mut record = handle.record.lock().expect("job lock poisoned");
            if record.state.is_terminal() {
                return;
            }
            if let Some(state) = update.state {
                record.state = state;
            }
            if let Some(progress) = update.progress {
                record.progress = record.progress.max(progress.clamp(0.0, 1.0));
            }
            if let Some(phase) = update.phase {
                record.phase = phase;
            }
            if let Some(message) = update.message {
                record.message = message;
            }
            if let Some(tree) = update.tree {
                record.tree = Some(tree);
            }
            if record.state.is_terminal() {
                record.progress = 1.0;
            }
            record.snapshot(id, record.state == JobState::Completed)
        };

        handle.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    /// Atomic status snapshot. The tree is not included here; use
    /// [`JobRegistry::tree`] or the terminal snapshot of a subscription.
    #[must_use]
    pub fn status(&self, id: &JobId) -> Option<JobSnapshot> {
        let handle = self.handle(id)?;
        let record = handle.record.lock().expect("job lock poisoned");
        Some(record.snapshot(id, false))
    }

    /// The source descriptor the job was created with; immutable for the
    /// job's lifetime.
    #[must_use]
    pub fn source(&self, id: &JobId) -> Option<String> {
        let handle = self.handle(id)?;
        let record = handle.record.lock().expect("job lock poisoned");
        Some(record.source.clone())
    }

    /// The finished tree, present only once the job completed.
    #[must_use]
    pub fn tree(&self, id: &JobId) -> Option<Node> {
        let handle = self.handle(id)?;
        let record = handle.record.lock().expect("job lock poisoned");
        if record.state == JobState::Completed {
            record.tree.clone()
        } else {
            None
        }
    }

    /// Push-style observation: yields a snapshot whenever the job visibly
    /// changes; the terminal snapshot (with tree, when completed) is the last
    /// delivered value.
    #[must_use]
    pub fn subscribe(&self, id: &JobId) -> Option<watch::Receiver<JobSnapshot>> {
        Some(self.handle(id)?.snapshot_tx.subscribe())
    }

    /// Eviction hook for the surrounding service; dropping a job also ends
    /// its subscriptions.
    pub fn remove(&self, id: &JobId) -> bool {
        self.jobs
            .write()
            .expect("job registry lock poisoned")
            .remove(id)
            .is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs
            .read()
            .expect("job registry lock poisoned")
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn leaf() -> Node {
        let mut node = Node::file("a.rs", "a.rs", None, 1);
        node.summary = Some("A file.".into());
        node
    }

    #[test]
    fn created_jobs_start_queued() {
        let registry = JobRegistry::new();
        let id = registry.create("/tmp/repo");

        let snapshot = registry.status(&id).unwrap();
        assert_eq!(snapshot.state, JobState::Queued);
        assert_eq!(snapshot.progress, 0.0);
        assert_eq!(snapshot.phase, "queued");
        assert!(snapshot.tree.is_none());
        assert_eq!(registry.source(&id), Some("/tmp/repo".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn updates_apply_only_provided_fields() {
        let registry = JobRegistry::new();
        let id = registry.create("x");

        registry.update(
            &id,
            JobUpdate::milestone(0.2, "scanning", "walking").state(JobState::Running),
        );
        registry.update(&id, JobUpdate::new().progress(0.4));

        let snapshot = registry.status(&id).unwrap();
        assert_eq!(snapshot.state, JobState::Running);
        assert_eq!(snapshot.progress, 0.4);
        assert_eq!(snapshot.phase, "scanning");
        assert_eq!(snapshot.message, "walking");
    }

    #[test]
    fn unknown_job_is_a_silent_noop() {
        let registry = JobRegistry::new();
        let bogus = JobId::new();
        registry.update(&bogus, JobUpdate::failed("nope"));
        assert_eq!(registry.status(&bogus), None);
        assert_eq!(registry.tree(&bogus), None);
        assert!(registry.subscribe(&bogus).is_none());
    }

    #[test]
    fn progress_never_decreases() {
        let registry = JobRegistry::new();
        let id = registry.create("x");

        registry.update(&id, JobUpdate::new().progress(0.6));
        registry.update(&id, JobUpdate::new().progress(0.3));
        assert_eq!(registry.status(&id).unwrap().progress, 0.6);

        registry.update(&id, JobUpdate::new().progress(7.0));
        assert_eq!(registry.status(&id).unwrap().progress, 1.0);
    }

    #[test]
    fn terminal_states_absorb_updates_and_pin_progress() {
        let registry = JobRegistry::new();
        let id = registry.create("x");

        registry.update(&id, JobUpdate::new().state(JobState::Failed).progress(0.4));
        let snapshot = registry.status(&id).unwrap();
        assert_eq!(snapshot.state, JobState::Failed);
        assert_eq!(snapshot.progress, 1.0);

        registry.update(&id, JobUpdate::milestone(0.1, "scanning", "again"));
        let after = registry.status(&id).unwrap();
        assert_eq!(after.state, JobState::Failed);
        assert_eq!(after.progress, 1.0);
        assert_eq!(after.phase, snapshot.phase);
    }

    #[test]
    fn tree_is_readable_only_after_completion() {
        let registry = JobRegistry::new();
        let id = registry.create("x");

        registry.update(&id, JobUpdate::new().tree(leaf()));
        assert_eq!(registry.tree(&id), None);

        registry.update(&id, JobUpdate::completed(leaf()));
        assert_eq!(registry.tree(&id), Some(leaf()));
    }

    #[tokio::test]
    async fn subscribers_see_changes_and_the_terminal_snapshot() {
        let registry = JobRegistry::new();
        let id = registry.create("x");
        let mut rx = registry.subscribe(&id).unwrap();

        registry.update(
            &id,
            JobUpdate::milestone(0.5, "analyzing", "half way").state(JobState::Running),
        );
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().progress, 0.5);

        registry.update(&id, JobUpdate::completed(leaf()));
        rx.changed().await.unwrap();
        let terminal = rx.borrow().clone();
        assert_eq!(terminal.state, JobState::Completed);
        assert_eq!(terminal.progress, 1.0);
        assert!(terminal.tree.is_some());

        // Redundant updates after terminal do not wake observers.
        registry.update(&id, JobUpdate::milestone(0.1, "scanning", "zombie"));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn removed_jobs_are_gone() {
        let registry = JobRegistry::new();
        let id = registry.create("x");
        assert!(registry.remove(&id));
        assert!(!registry.remove(&id));
        assert_eq!(registry.status(&id), None);
        assert!(registry.is_empty());
    }
}
