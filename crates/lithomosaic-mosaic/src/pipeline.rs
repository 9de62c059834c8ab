//! Parallel source preparation with an ordered, sequential merge

use chrono::Utc;
use lithomosaic_core::config::MosaicSettings;
use lithomosaic_core::error::{MosaicError, Result};
use lithomosaic_core::metadata::MetadataNormalizer;
use lithomosaic_core::ports::SourceAdapter;
use lithomosaic_geo::{CounterSnapshot, DropCounters, SelfOverlapResolver};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;
use uuid::Uuid;

use crate::builder::MosaicBuilder;
use crate::cache::{settings_fingerprint, WorkCache};
use crate::models::{MosaicOutput, PreparedSource};
use crate::retry::RetryPolicy;

/// Coarse cancellation: once set, no further sources are dispatched
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything a worker needs to prepare one source on its own
struct SourceWorker<A> {
    adapter: Arc<A>,
    normalizer: MetadataNormalizer,
    settings: MosaicSettings,
    cache: Option<WorkCache>,
    retry: RetryPolicy,
}

impl<A: SourceAdapter + 'static> SourceWorker<A> {
    /// Fetch, normalize and self-resolve one source, or load it from the cache
    async fn prepare(self, source_id: String, priority: usize) -> Result<PreparedSource> {
        if let Some(cache) = &self.cache {
            match cache.load(&source_id, priority) {
                Ok(Some(batch)) => {
                    tracing::info!(units = batch.len(), "Using cached resolved batch");
                    return Ok(PreparedSource {
                        input_features: batch.len(),
                        batch,
                        counters: CounterSnapshot::default(),
                        from_cache: true,
                    });
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "Ignoring unreadable cache entry"),
            }
        }

        let records = self.retry.fetch(self.adapter.as_ref(), &source_id).await?;
        let skipped = self.adapter.skipped_features(&source_id);
        let input_features = records.len() + skipped as usize;
        tracing::info!(records = records.len(), skipped, "Fetched source");

        let normalizer = self.normalizer;
        let settings = self.settings;
        let id = source_id.clone();
        let span = tracing::Span::current();
        let (batch, counters) = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            let counters = Arc::new(DropCounters::new());
            counters.record_skipped(skipped);
            let (batch, stats) = normalizer.normalize(&id, priority, records);
            counters.record_ontology_misses(stats.ontology_misses as u64);

            let resolved = SelfOverlapResolver::new(&settings, Arc::clone(&counters)).resolve(batch)?;
            Ok::<_, MosaicError>((resolved, counters.snapshot()))
        })
        .await
        .map_err(|e| MosaicError::WorkerFailed {
            source_id: source_id.clone(),
            reason: e.to_string(),
        })??;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(&batch) {
                tracing::warn!(error = %e, "Failed to cache resolved batch");
            }
        }

        Ok(PreparedSource {
            batch,
            input_features,
            counters,
            from_cache: false,
        })
    }
}

/// Runs a mosaic job over an ordered source list.
///
/// Sources are fetched, normalized and self-resolved concurrently, at most
/// `concurrency` at a time. Merging happens afterwards in strict priority
/// order on the calling task. A failed run keeps its builder as a
/// checkpoint, and the next `run` over the same list resumes from the first
/// source that was not merged.
pub struct MosaicPipeline<A>
where
    A: SourceAdapter + 'static,
{
    adapter: Arc<A>,
    settings: MosaicSettings,
    normalizer: MetadataNormalizer,
    cache: Option<WorkCache>,
    retry: RetryPolicy,
    cancel: CancellationFlag,
    counters: Arc<DropCounters>,
    checkpoint: Option<MosaicBuilder>,
}

impl<A> MosaicPipeline<A>
where
    A: SourceAdapter + 'static,
{
    pub fn new(adapter: A, settings: MosaicSettings) -> Self {
        let cache = settings.work_dir.as_ref().map(WorkCache::new);
        Self {
            adapter: Arc::new(adapter),
            retry: RetryPolicy::from_settings(&settings),
            settings,
            normalizer: MetadataNormalizer::new(),
            cache,
            cancel: CancellationFlag::new(),
            counters: Arc::new(DropCounters::new()),
            checkpoint: None,
        }
    }

    pub fn with_normalizer(mut self, normalizer: MetadataNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_cache(mut self, cache: WorkCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn settings(&self) -> &MosaicSettings {
        &self.settings
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Handle for cancelling runs from another task
    pub fn cancellation_flag(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    pub fn counters(&self) -> Arc<DropCounters> {
        Arc::clone(&self.counters)
    }

    /// Builder state kept from a failed run
    pub fn checkpoint(&self) -> Option<&MosaicBuilder> {
        self.checkpoint.as_ref()
    }

    /// Restart the job: forget the checkpoint, its layer and mask, and the counters
    pub fn reset(&mut self) {
        if let Some(builder) = self.checkpoint.as_mut() {
            builder.reset();
        }
        self.checkpoint = None;
        self.counters.reset();
    }

    /// Remove cached artifacts for the listed sources
    pub fn clean_cache(&self, source_ids: &[String]) -> Result<usize> {
        match &self.cache {
            Some(cache) => cache.clean(source_ids),
            None => Ok(0),
        }
    }

    pub async fn run(&mut self, sources: &[String]) -> Result<MosaicOutput> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("mosaic_run", %run_id, sources = sources.len());
        self.run_inner(run_id, sources).instrument(span).await
    }

    async fn run_inner(&mut self, run_id: Uuid, sources: &[String]) -> Result<MosaicOutput> {
        let started_at = Utc::now();

        let mut builder = match self.checkpoint.take() {
            Some(builder) if builder.sources() == sources => {
                tracing::info!(next = ?builder.next_index(), "Resuming from checkpoint");
                builder
            }
            _ => {
                self.counters.reset();
                MosaicBuilder::new(sources.to_vec(), &self.settings, Arc::clone(&self.counters))
            }
        };

        let start = builder.next_index().unwrap_or(sources.len());
        let mut prepared = self.prepare_all(sources, start).await;

        for priority in start..sources.len() {
            let source_id = &sources[priority];
            let result = prepared.remove(&priority).unwrap_or_else(|| {
                Err(MosaicError::WorkerFailed {
                    source_id: source_id.clone(),
                    reason: "worker ended without a result".to_string(),
                })
            });

            let merged = result.and_then(|source| {
                self.counters.absorb(&source.counters);
                builder.push_resolved(source)
            });
            if let Err(err) = merged {
                tracing::error!(source = %source_id, error = %err, "Source failed, keeping checkpoint");
                self.checkpoint = Some(builder);
                return Err(err);
            }
        }

        let output = MosaicOutput {
            run_id,
            layer: builder.layer().clone(),
            mask: builder.mask().geometry().clone(),
            reports: builder.reports().to_vec(),
            counters: self.counters.snapshot(),
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            features = output.layer.len(),
            area = output.layer.total_area(),
            dropped = output.counters.total_dropped(),
            "Mosaic complete"
        );
        Ok(output)
    }

    /// Prepare sources from `start` on, keyed by priority
    async fn prepare_all(
        &self,
        sources: &[String],
        start: usize,
    ) -> BTreeMap<usize, Result<PreparedSource>> {
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let mut results = BTreeMap::new();
        let fingerprint = settings_fingerprint(&self.settings, self.normalizer.code_convention());
        let cache = self.cache.clone().map(|c| c.with_fingerprint(fingerprint));

        for (priority, source_id) in sources.iter().enumerate().skip(start) {
            if self.cancel.is_cancelled() {
                results.insert(priority, Err(cancelled(source_id)));
                continue;
            }
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    results.insert(priority, Err(cancelled(source_id)));
                    continue;
                }
            };
            // Cancellation may have happened while waiting for a free worker
            if self.cancel.is_cancelled() {
                results.insert(priority, Err(cancelled(source_id)));
                continue;
            }

            let worker = SourceWorker {
                adapter: Arc::clone(&self.adapter),
                normalizer: self.normalizer,
                settings: self.settings.clone(),
                cache: cache.clone(),
                retry: self.retry,
            };
            let id = source_id.clone();
            let span = tracing::info_span!("source", source = %id, priority);
            tasks.spawn(
                async move {
                    let _permit = permit;
                    let result = worker.prepare(id, priority).await;
                    (priority, result)
                }
                .instrument(span),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((priority, result)) => {
                    if let Err(e) = &result {
                        tracing::warn!(priority, error = %e, "Source preparation failed");
                    }
                    results.insert(priority, result);
                }
                Err(e) => tracing::error!(error = %e, "Source worker panicked"),
            }
        }
        results
    }
}

fn cancelled(source_id: &str) -> MosaicError {
    tracing::info!(source = source_id, "Not dispatching source after cancellation");
    MosaicError::Cancelled {
        source_id: source_id.to_string(),
    }
}
