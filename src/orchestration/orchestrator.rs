//! # Pipeline Orchestrator
//!
//! Bounded-concurrency worker pool over a single FIFO queue.
//!
//! ## Lifecycle of `run_batch`
//!
//! 1. Every request is validated. Invalid ones get a `Failed` result straight away;
//!    valid ones are enqueued with their submission ordinal.
//! 2. `initial` workers are spawned. Each pops an item, runs it through the
//!    [`StageExecutor`], appends the result to the [`ResultSink`] and repeats until
//!    the queue is empty, a stop is requested, or it is surplus to the current budget.
//! 3. After every checkpoint of `K` completions (where `K` is the budget when the
//!    checkpoint opened) the coordinator records one usage sample into the
//!    [`AdaptiveThrottle`] and applies its decision. Growing spawns workers; shrinking
//!    lets surplus workers retire after their current item.
//! 4. Items still queued after the workers exit are reported `Cancelled`.
//!
//! Exactly one result is returned per submitted request, in completion order.

use crossbeam::queue::SegQueue;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::cache::TtlCache;
use crate::config::PipelineConfig;
use crate::constants::OverallStatus;
use crate::error::{PipelineError, Result};
use crate::logging::{log_error, log_item_operation};
use crate::models::{BatchSummary, PipelineResult, WorkItem, WorkItemRequest};
use crate::orchestration::adaptive_throttle::AdaptiveThrottle;
use crate::orchestration::collaborators::Collaborators;
use crate::orchestration::metrics::BatchMetrics;
use crate::orchestration::result_sink::ResultSink;
use crate::orchestration::shutdown::ShutdownHandle;
use crate::orchestration::selection_ledger::SelectionLedger;
use crate::orchestration::stage_executor::{panic_message, GenerationCache, StageExecutor};
use crate::resilience::{FixedWindowRateLimiter, JitterSource, RetryExecutor, RetryPolicy};

/// Everything `run_batch` produced
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// One result per submitted request, in completion order
    pub results: Vec<PipelineResult>,
    pub summary: BatchSummary,
}

impl BatchOutcome {
    /// Results sorted by submission ordinal
    pub fn in_submission_order(&self) -> Vec<&PipelineResult> {
        let mut ordered: Vec<&PipelineResult> = self.results.iter().collect();
        ordered.sort_by_key(|r| r.ordinal);
        ordered
    }

    /// Overall statuses in submission order
    pub fn statuses(&self) -> Vec<OverallStatus> {
        self.in_submission_order()
            .into_iter()
            .map(|r| r.overall_status)
            .collect()
    }

    pub fn result_for(&self, item_id: &str) -> Option<&PipelineResult> {
        self.results.iter().find(|r| r.item_id == item_id)
    }
}

#[derive(Debug)]
struct QueuedItem {
    ordinal: usize,
    item: Arc<WorkItem>,
}

/// Queue and worker budget shared between the coordinator and its workers
#[derive(Debug)]
struct PoolState {
    queue: SegQueue<QueuedItem>,
    target_workers: AtomicUsize,
    active_workers: AtomicUsize,
    next_worker_id: AtomicUsize,
}

impl PoolState {
    fn new(target: usize) -> Self {
        Self {
            queue: SegQueue::new(),
            target_workers: AtomicUsize::new(target),
            active_workers: AtomicUsize::new(0),
            next_worker_id: AtomicUsize::new(0),
        }
    }

    /// Claim a retirement slot when more workers are running than the budget allows
    fn try_retire(&self) -> bool {
        let mut active = self.active_workers.load(Ordering::SeqCst);
        loop {
            if active <= self.target_workers.load(Ordering::SeqCst) {
                return false;
            }
            match self.active_workers.compare_exchange(
                active,
                active - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(observed) => active = observed,
            }
        }
    }
}

/// Sent by a worker after each item
#[derive(Debug, Clone, Copy)]
struct Completion {
    elapsed_ms: u64,
    failed: bool,
}

/// Completions observed since the current checkpoint opened
#[derive(Debug, Default)]
struct CheckpointWindow {
    size: usize,
    completed: usize,
    failed: usize,
    total_latency_ms: u64,
}

impl CheckpointWindow {
    fn open(size: usize) -> Self {
        Self {
            size: size.max(1),
            ..Default::default()
        }
    }

    fn observe(&mut self, completion: Completion) -> bool {
        self.completed += 1;
        self.total_latency_ms += completion.elapsed_ms;
        if completion.failed {
            self.failed += 1;
        }
        self.completed >= self.size
    }

    fn is_empty(&self) -> bool {
        self.completed == 0
    }

    fn error_rate(&self) -> f64 {
        if self.completed == 0 {
            0.0
        } else {
            self.failed as f64 / self.completed as f64
        }
    }

    fn mean_latency_ms(&self) -> f64 {
        if self.completed == 0 {
            0.0
        } else {
            self.total_latency_ms as f64 / self.completed as f64
        }
    }
}

/// Per-batch handles cloned into every worker
#[derive(Clone)]
struct WorkerContext {
    pool: Arc<PoolState>,
    executor: Arc<StageExecutor>,
    sink: Arc<ResultSink>,
    metrics: Arc<BatchMetrics>,
    ledger: Arc<SelectionLedger>,
    shutdown: ShutdownHandle,
    completions: mpsc::UnboundedSender<Completion>,
}

#[derive(Debug)]
pub struct PipelineOrchestrator {
    config: PipelineConfig,
    executor: Arc<StageExecutor>,
    throttle: Arc<AdaptiveThrottle>,
    shutdown: ShutdownHandle,
}

impl PipelineOrchestrator {
    /// Build an orchestrator owning its cache, rate limiter and throttle.
    ///
    /// The configuration is validated; retry jitter is seeded from `retry.seed` when set.
    pub fn new(config: PipelineConfig, collaborators: Collaborators) -> Result<Self> {
        let retry = RetryExecutor::from_config(&config.retry);
        Self::build(config, collaborators, retry)
    }

    /// Same as [`new`](Self::new) with an explicit jitter source
    pub fn with_jitter(
        config: PipelineConfig,
        collaborators: Collaborators,
        jitter: Arc<dyn JitterSource>,
    ) -> Result<Self> {
        let retry = RetryExecutor::new(RetryPolicy::from_config(&config.retry), jitter);
        Self::build(config, collaborators, retry)
    }

    fn build(config: PipelineConfig, collaborators: Collaborators, retry: RetryExecutor) -> Result<Self> {
        config.validate()?;

        let cache: Arc<GenerationCache> = Arc::new(TtlCache::new(config.cache.capacity));
        let rate_limiter = Arc::new(FixedWindowRateLimiter::from_config(&config.rate_limit));
        let executor = Arc::new(StageExecutor::new(
            &config,
            collaborators,
            cache,
            rate_limiter,
            retry,
        ));
        let throttle = Arc::new(AdaptiveThrottle::new(&config.throttle, &config.concurrency));

        info!(
            min = config.concurrency.min,
            max = config.concurrency.max,
            initial = config.concurrency.initial,
            "🚀 ORCHESTRATOR: Pipeline orchestrator created"
        );

        Ok(Self {
            config,
            executor,
            throttle,
            shutdown: ShutdownHandle::new(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Handle for requesting a cooperative stop from another task
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn cache(&self) -> &Arc<GenerationCache> {
        self.executor.cache()
    }

    pub fn rate_limiter(&self) -> &Arc<FixedWindowRateLimiter> {
        self.executor.rate_limiter()
    }

    pub fn throttle(&self) -> &Arc<AdaptiveThrottle> {
        &self.throttle
    }

    /// Process a batch and return exactly one result per request
    pub async fn run_batch(&self, requests: Vec<WorkItemRequest>) -> BatchOutcome {
        let started = Instant::now();
        let total = requests.len();
        let initial = self.config.concurrency.initial;

        let metrics = Arc::new(BatchMetrics::new());
        let sink = Arc::new(ResultSink::with_capacity(total));
        let pool = Arc::new(PoolState::new(initial));
        let mut enqueued: Vec<(usize, String, String)> = Vec::with_capacity(total);
        let mut rejected = 0;

        for (ordinal, request) in requests.into_iter().enumerate() {
            let request = request.ensure_id();
            let display_id = request.display_id();
            let tenant_id = request.tenant_id.clone();
            match request.into_work_item() {
                Ok(item) => {
                    log_item_operation("enqueue", &item.id, &item.tenant_id, "queued", None);
                    enqueued.push((ordinal, item.id.clone(), item.tenant_id.clone()));
                    pool.queue.push(QueuedItem {
                        ordinal,
                        item: Arc::new(item),
                    });
                }
                Err(error) => {
                    rejected += 1;
                    let message = error.to_string();
                    log_item_operation("enqueue", &display_id, &tenant_id, "rejected", Some(&message));
                    sink.push(PipelineResult::rejected(display_id, tenant_id, ordinal, error).finalize(0, None));
                }
            }
        }

        info!(
            total = total,
            queued = enqueued.len(),
            rejected = rejected,
            concurrency = initial,
            "📦 BATCH: Starting batch"
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        let context = WorkerContext {
            pool: Arc::clone(&pool),
            executor: Arc::clone(&self.executor),
            sink: Arc::clone(&sink),
            metrics: Arc::clone(&metrics),
            ledger: Arc::new(SelectionLedger::new(self.config.selection.dedupe_across_batch)),
            shutdown: self.shutdown.clone(),
            completions: tx,
        };

        let mut workers = JoinSet::new();
        spawn_workers(&mut workers, &context, initial.min(enqueued.len()));

        let mut window = CheckpointWindow::open(initial);
        let mut finished = 0_usize;

        loop {
            tokio::select! {
                Some(completion) = rx.recv() => {
                    finished += 1;
                    if window.observe(completion) {
                        self.checkpoint(&window, &context, Some(&mut workers), finished, enqueued.len());
                        window = CheckpointWindow::open(pool.target_workers.load(Ordering::SeqCst));
                    }
                }
                joined = workers.join_next() => match joined {
                    Some(Ok(())) => {}
                    Some(Err(join_error)) => {
                        log_error("orchestrator", "worker_join", &join_error.to_string(), None);
                    }
                    None => break,
                },
            }
        }

        // Completions sent just before the last worker exited
        while let Ok(completion) = rx.try_recv() {
            finished += 1;
            if window.observe(completion) {
                self.checkpoint(&window, &context, None, finished, enqueued.len());
                window = CheckpointWindow::open(pool.target_workers.load(Ordering::SeqCst));
            }
        }
        if !window.is_empty() {
            self.checkpoint(&window, &context, None, finished, enqueued.len());
        }
        drop(context);

        let cancelled = self.reconcile(&pool, &sink, &enqueued);

        let results = sink.drain();
        let summary = metrics.summarize(
            &results,
            rejected,
            cancelled,
            initial,
            pool.target_workers.load(Ordering::SeqCst),
            started.elapsed().as_millis() as u64,
        );

        info!(
            total = summary.total,
            success = summary.success,
            partial = summary.partial,
            failed = summary.failed,
            cancelled = summary.cancelled,
            cache_hits = summary.cache_hits,
            generator_calls = summary.generator_calls,
            retries = summary.retries,
            rate_limited = summary.rate_limited,
            peak_in_flight = summary.peak_in_flight,
            success_rate = summary.success_rate(),
            elapsed_ms = summary.elapsed_ms,
            "📊 BATCH: Completed"
        );

        BatchOutcome { results, summary }
    }

    /// Feed one usage sample to the throttle and apply its decision.
    ///
    /// `workers` is `None` once the pool has drained; the budget is still updated but
    /// nothing is spawned.
    fn checkpoint(
        &self,
        window: &CheckpointWindow,
        context: &WorkerContext,
        workers: Option<&mut JoinSet<()>>,
        finished: usize,
        queued: usize,
    ) {
        context.metrics.record_checkpoint();
        self.rate_limiter().purge_stale(Instant::now());

        let usage = AdaptiveThrottle::usage_from(
            window.error_rate(),
            window.mean_latency_ms(),
            self.config.throttle.latency_budget_ms,
        );
        self.throttle.record_sample(usage);

        let pool = &context.pool;
        let current = pool.target_workers.load(Ordering::SeqCst);
        let next = self.throttle.next_concurrency(current);

        info!(
            completed = finished,
            queued = queued,
            remaining = pool.queue.len(),
            usage = usage,
            error_rate = window.error_rate(),
            concurrency = current,
            "📊 BATCH: Checkpoint"
        );

        if next == current || context.shutdown.is_stopping() {
            return;
        }

        pool.target_workers.store(next, Ordering::SeqCst);
        context.metrics.record_adjustment();
        info!(from = current, to = next, "🎛️ SCALING: Concurrency budget adjusted");

        if let Some(workers) = workers {
            if next > current && !pool.queue.is_empty() {
                let active = pool.active_workers.load(Ordering::SeqCst);
                spawn_workers(workers, context, next.saturating_sub(active));
            }
        }
    }

    /// Report queued leftovers as cancelled and fill any gap left by a lost worker.
    /// Returns the number of cancelled items.
    fn reconcile(
        &self,
        pool: &PoolState,
        sink: &ResultSink,
        enqueued: &[(usize, String, String)],
    ) -> usize {
        let mut cancelled = 0;
        while let Some(queued) = pool.queue.pop() {
            cancelled += 1;
            log_item_operation("cancel", &queued.item.id, &queued.item.tenant_id, "cancelled", None);
            sink.push(
                PipelineResult::rejected(
                    queued.item.id.clone(),
                    queued.item.tenant_id.clone(),
                    queued.ordinal,
                    PipelineError::Cancelled,
                )
                .finalize(0, None),
            );
        }
        if cancelled > 0 {
            warn!(cancelled = cancelled, "🛑 BATCH: Items cancelled before processing");
        }

        let recorded = sink.recorded_ordinals();
        for (ordinal, item_id, tenant_id) in enqueued {
            if !recorded.contains(ordinal) {
                error!(item_id = %item_id, ordinal = ordinal, "Item lost without a result");
                sink.push(
                    PipelineResult::rejected(
                        item_id.clone(),
                        tenant_id.clone(),
                        *ordinal,
                        PipelineError::WorkerPanicked {
                            message: "worker exited before recording a result".to_string(),
                        },
                    )
                    .finalize(0, None),
                );
            }
        }
        cancelled
    }
}

fn spawn_workers(workers: &mut JoinSet<()>, context: &WorkerContext, count: usize) {
    for _ in 0..count {
        let worker_id = context.pool.next_worker_id.fetch_add(1, Ordering::SeqCst);
        context.pool.active_workers.fetch_add(1, Ordering::SeqCst);
        debug!(worker_id = worker_id, "👷 WORKER: Spawned");
        workers.spawn(worker_loop(worker_id, context.clone()));
    }
}

async fn worker_loop(worker_id: usize, context: WorkerContext) {
    let WorkerContext {
        pool,
        executor,
        sink,
        metrics,
        ledger,
        shutdown,
        completions,
    } = context;

    let retired = loop {
        if shutdown.is_stopping() {
            break false;
        }
        if pool.try_retire() {
            break true;
        }
        let Some(queued) = pool.queue.pop() else {
            break false;
        };

        metrics.item_started();
        let started = Instant::now();
        let execution = executor.execute(&queued.item, queued.ordinal, worker_id, &metrics, &ledger);
        let outcome = AssertUnwindSafe(execution).catch_unwind().await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                log_error("worker", "execute_item", &message, Some(&queued.item.id));
                PipelineResult::rejected(
                    queued.item.id.clone(),
                    queued.item.tenant_id.clone(),
                    queued.ordinal,
                    PipelineError::WorkerPanicked { message },
                )
                .finalize(elapsed_ms, Some(worker_id))
            }
        };
        metrics.item_finished();

        let failed = result.overall_status == OverallStatus::Failed;
        log_item_operation(
            "complete",
            &result.item_id,
            &result.tenant_id,
            &result.overall_status.to_string(),
            result.first_error().map(PipelineError::code),
        );
        sink.push(result);

        // The coordinator only stops listening once every worker has exited
        let _ = completions.send(Completion { elapsed_ms, failed });
    };

    if !retired {
        pool.active_workers.fetch_sub(1, Ordering::SeqCst);
    }
    debug!(worker_id = worker_id, retired = retired, "👷 WORKER: Exiting");
}
