use crate::cache::{Fingerprint, SummaryCache};
use crate::error::SummarizerError;
use crate::fallback::naive_summary;
use crate::Summarize;
use atlas_protocol::{PendingFile, RepoContext};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

const DEFAULT_MAX_BATCH_BYTES: usize = 48_000;
const DEFAULT_BATCH_CONCURRENCY: usize = 4;
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
pub struct DispatcherConfig {
    /// Total content bytes allowed per batch. A single oversized item still
    /// fills a batch alone.
    pub max_batch_bytes: usize,

    /// Concurrent in-flight batches per `summarize_all` call.
    pub batch_concurrency: usize,

    /// Hard deadline per external call; a timeout is treated as a failure.
    pub call_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_batch_bytes: DEFAULT_MAX_BATCH_BYTES,
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

impl DispatcherConfig {
    /// Read overrides from the environment, clamped to sane bounds.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let max_batch_bytes = env_usize("ATLAS_MAX_BATCH_BYTES", defaults.max_batch_bytes)
            .clamp(1_000, 1_000_000);
        let batch_concurrency =
            env_usize("ATLAS_BATCH_CONCURRENCY", defaults.batch_concurrency).clamp(1, 16);
        let timeout_secs = env_usize(
            "ATLAS_SUMMARY_TIMEOUT_SECS",
            defaults.call_timeout.as_secs() as usize,
        )
        .clamp(1, 600);
        Self {
            max_batch_bytes,
            batch_concurrency,
            call_timeout: Duration::from_secs(timeout_secs as u64),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

/// Progress notification sent after each batch finishes, successful or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchProgress {
    pub completed: usize,
    pub total: usize,
}

/// Resolves summaries for pending files: cache first, then size-bounded
/// batches against the external service, then the local fallback for every
/// remaining miss. Total over its input and never errors.
pub struct BatchDispatcher {
    cache: Arc<SummaryCache>,
    backend: Option<Arc<dyn Summarize>>,
    config: DispatcherConfig,
}

struct Group<'a> {
    fingerprint: Fingerprint,
    representative: &'a PendingFile,
    paths: Vec<&'a str>,
}

impl BatchDispatcher {
    #[must_use]
    pub fn new(
        cache: Arc<SummaryCache>,
        backend: Arc<dyn Summarize>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            cache,
            backend: Some(backend),
            config,
        }
    }

    /// Dispatcher with no external collaborator: every miss resolves through
    /// the local fallback summarizer.
    #[must_use]
    pub fn local_only(cache: Arc<SummaryCache>, config: DispatcherConfig) -> Self {
        Self {
            cache,
            backend: None,
            config,
        }
    }

    pub async fn summarize_all(
        &self,
        items: &[PendingFile],
        ctx: &RepoContext,
    ) -> HashMap<String, String> {
        self.summarize_all_with_progress(items, ctx, None).await
    }

    /// Resolve one summary per input path. When `progress` is given, a
    /// [`DispatchProgress`] message is sent after every finished batch.
    pub async fn summarize_all_with_progress(
        &self,
        items: &[PendingFile],
        ctx: &RepoContext,
        progress: Option<mpsc::UnboundedSender<DispatchProgress>>,
    ) -> HashMap<String, String> {
        let mut out: HashMap<String, String> = HashMap::with_capacity(items.len());

        // Items with withheld content (binary, oversized, unreadable) are
        // summarized from their name alone and bypass both the cache and the
        // external service.
        let mut groups: Vec<Group<'_>> = Vec::new();
        let mut group_index: HashMap<Fingerprint, usize> = HashMap::new();
        for item in items {
            if item.content.is_empty() {
                out.insert(
                    item.path.clone(),
                    naive_summary(&item.path, "", item.language.as_deref()),
                );
                continue;
            }
            let fingerprint = Fingerprint::of(item.content.as_bytes());
            match group_index.get(&fingerprint) {
                Some(&idx) => groups[idx].paths.push(&item.path),
                None => {
                    group_index.insert(fingerprint.clone(), groups.len());
                    groups.push(Group {
                        fingerprint,
                        representative: item,
                        paths: vec![&item.path],
                    });
                }
            }
        }

        let mut cache_hits = 0usize;
        let mut miss_ids: Vec<usize> = Vec::new();
        for (idx, group) in groups.iter().enumerate() {
            if self.cache.get(&group.fingerprint).is_some() {
                cache_hits += 1;
            } else {
                miss_ids.push(idx);
            }
        }
        log::debug!(
            "summarize_all: {} items, {} unique contents, {} cache hits",
            items.len(),
            groups.len(),
            cache_hits
        );

        let batch_hits = match &self.backend {
            Some(backend) if !miss_ids.is_empty() => {
                let lens: Vec<(usize, usize)> = miss_ids
                    .iter()
                    .map(|&idx| (idx, groups[idx].representative.content.len()))
                    .collect();
                let batches = pack_batches(&lens, self.config.max_batch_bytes);
                self.dispatch_batches(&groups, batches, backend.clone(), ctx, progress)
                    .await
            }
            _ => HashMap::new(),
        };

        for group in &groups {
            let rep = group.representative;
            let resolved = self
                .cache
                .get(&group.fingerprint)
                .or_else(|| batch_hits.get(rep.path.as_str()).cloned())
                .unwrap_or_else(|| naive_summary(&rep.path, &rep.content, rep.language.as_deref()));
            let stored = self
                .cache
                .insert_if_absent(group.fingerprint.clone(), resolved);
            for path in &group.paths {
                out.insert((*path).to_string(), stored.clone());
            }
        }

        out
    }

    async fn dispatch_batches(
        &self,
        groups: &[Group<'_>],
        batches: Vec<Vec<usize>>,
        backend: Arc<dyn Summarize>,
        ctx: &RepoContext,
        progress: Option<mpsc::UnboundedSender<DispatchProgress>>,
    ) -> HashMap<String, String> {
        let total = batches.len();
        let semaphore = Arc::new(Semaphore::new(self.config.batch_concurrency.max(1)));
        let mut join = JoinSet::new();

        for batch in batches {
            let payload: Vec<PendingFile> = batch
                .iter()
                .map(|&idx| groups[idx].representative.clone())
                .collect();
            let backend = backend.clone();
            let ctx = ctx.clone();
            let semaphore = semaphore.clone();
            let timeout = self.config.call_timeout;
            join.spawn(async move {
                // The semaphore is never closed; acquire failures are not expected.
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .unwrap_or_else(|_| unreachable!("batch semaphore closed"));
                let outcome = match tokio::time::timeout(
                    timeout,
                    backend.summarize_batch(&payload, &ctx),
                )
                .await
                {
                    Ok(Ok(map)) => Ok(map),
                    Ok(Err(err)) => Err(err),
                    Err(_) => Err(SummarizerError::Timeout(timeout)),
                };
                (payload, outcome)
            });
        }

        let mut hits: HashMap<String, String> = HashMap::new();
        let mut completed = 0usize;
        while let Some(joined) = join.join_next().await {
            completed += 1;
            match joined {
                Ok((payload, Ok(map))) => {
                    // Match responses back by path; anything absent is a miss
                    // and resolves through the fallback later.
                    for item in &payload {
                        if let Some(summary) = map.get(&item.path) {
                            hits.insert(item.path.clone(), summary.clone());
                        } else {
                            log::debug!("no summary returned for {}", item.path);
                        }
                    }
                }
                Ok((payload, Err(err))) => {
                    log::warn!(
                        "summarization batch of {} items failed: {err}; using local fallback",
                        payload.len()
                    );
                }
                Err(err) => log::warn!("summarization batch task failed: {err}"),
            }
            if let Some(tx) = &progress {
                let _ = tx.send(DispatchProgress { completed, total });
            }
        }

        hits
    }
}

/// Greedy packing of `(id, content_len)` pairs into ordered batches under a
/// byte budget. Order is preserved; an item larger than the budget occupies a
/// batch of its own.
fn pack_batches(lens: &[(usize, usize)], max_batch_bytes: usize) -> Vec<Vec<usize>> {
    let mut batches = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    let mut current_bytes = 0usize;
    for &(id, len) in lens {
        if !current.is_empty() && current_bytes + len > max_batch_bytes {
            batches.push(std::mem::take(&mut current));
            current_bytes = 0;
        }
        current.push(id);
        current_bytes += len;
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}
