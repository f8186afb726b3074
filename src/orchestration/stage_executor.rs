//! # Stage Executor
//!
//! Drives one work item through Insight, Generate and Deliver.
//!
//! ## Generate
//!
//! 1. Derive the cache key; a live entry is returned as a cache hit.
//! 2. On a miss, ask the rate limiter for the tenant. A denial fails the stage as
//!    `RateLimited` without calling the generator or the retry executor.
//! 3. Call the generator through the [`RetryExecutor`], optionally bounding each attempt.
//! 4. Store successful content in the cache before returning it.
//!
//! A failed Insight or Generate stage short-circuits the rest of the item. A failed
//! Deliver leaves the item `Partial` with its generated content preserved. A panic in
//! any stage fires `Abort` on the item's state machine and fails the item.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cache::{generation_cache_key, TtlCache};
use crate::config::PipelineConfig;
use crate::constants::{CacheStatus, StageKind};
use crate::error::{ExternalError, PipelineError};
use crate::logging::{log_error, log_stage_operation};
use crate::models::{
    Content, Deliverable, DeliveryTarget, Insight, InsightWindow, PipelineResult, Prompt,
    RankedCandidate, RankingCriteria, Receipt, StageResult, WorkItem,
};
use crate::orchestration::collaborators::Collaborators;
use crate::orchestration::metrics::BatchMetrics;
use crate::orchestration::selection_ledger::SelectionLedger;
use crate::resilience::{
    ErrorClassifier, FixedWindowRateLimiter, RetryExecutor, RetryPolicy, StandardErrorClassifier,
};
use crate::services::CandidateRanker;
use crate::state_machine::{ItemEvent, ItemStateMachine};

/// Cache shared by every worker of an orchestrator
pub type GenerationCache = TtlCache<String, Content>;

pub struct StageExecutor {
    collaborators: Collaborators,
    cache: Arc<GenerationCache>,
    rate_limiter: Arc<FixedWindowRateLimiter>,
    generate_retry: RetryExecutor,
    deliver_retry: RetryExecutor,
    classifier: Arc<dyn ErrorClassifier<ExternalError>>,
    ranker: CandidateRanker,
    cache_ttl: Duration,
    attempt_timeout: Option<Duration>,
    insight_lookback_hours: u32,
}

impl StageExecutor {
    pub fn new(
        config: &PipelineConfig,
        collaborators: Collaborators,
        cache: Arc<GenerationCache>,
        rate_limiter: Arc<FixedWindowRateLimiter>,
        retry: RetryExecutor,
    ) -> Self {
        let deliver_policy = RetryPolicy::from_config(&config.retry)
            .with_max_attempts(config.delivery.redelivery.max_attempts());

        Self {
            collaborators,
            cache,
            rate_limiter,
            deliver_retry: retry.with_policy(deliver_policy),
            generate_retry: retry,
            classifier: Arc::new(StandardErrorClassifier),
            ranker: CandidateRanker::new(),
            cache_ttl: config.cache.ttl(),
            attempt_timeout: config.retry.attempt_timeout(),
            insight_lookback_hours: config.insight.lookback_hours,
        }
    }

    /// Replace the retryable/fatal classifier
    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier<ExternalError>>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_ranker(mut self, ranker: CandidateRanker) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn cache(&self) -> &Arc<GenerationCache> {
        &self.cache
    }

    pub fn rate_limiter(&self) -> &Arc<FixedWindowRateLimiter> {
        &self.rate_limiter
    }

    /// Run all stages for `item`. Stage failures are captured in the returned result.
    ///
    /// A panic inside a stage aborts the item: stages recorded before it are kept and
    /// the result carries a `WorkerPanicked` rejection.
    pub async fn execute(
        &self,
        item: &WorkItem,
        ordinal: usize,
        worker_id: usize,
        metrics: &BatchMetrics,
        ledger: &SelectionLedger,
    ) -> PipelineResult {
        let started = Instant::now();
        let mut machine = ItemStateMachine::new(item.id.clone());
        let mut result = PipelineResult::pending(item.id.clone(), item.tenant_id.clone(), ordinal);

        let outcome = AssertUnwindSafe(self.run_stages(item, &mut machine, &mut result, metrics, ledger))
            .catch_unwind()
            .await;

        match outcome {
            Ok(()) => advance(&mut machine, ItemEvent::Finish),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                log_error("stage_executor", "execute_item", &message, Some(&item.id));
                advance(&mut machine, ItemEvent::Abort(message.clone()));
                result.rejection = Some(PipelineError::WorkerPanicked { message });
            }
        }

        result.record_final_state(machine.current_state());
        let result = result.finalize(elapsed_ms(started), Some(worker_id));

        if machine.current_state().overall_status() != Some(result.overall_status) {
            warn!(
                item_id = %item.id,
                state = %machine.current_state(),
                status = %result.overall_status,
                "State machine and recorded stages disagree"
            );
        }
        result
    }

    async fn run_stages(
        &self,
        item: &WorkItem,
        machine: &mut ItemStateMachine,
        result: &mut PipelineResult,
        metrics: &BatchMetrics,
        ledger: &SelectionLedger,
    ) {
        advance(machine, ItemEvent::StartInsight);
        let insight = self.run_insight(item).await;
        let insight_value = insight.value.clone();
        advance(machine, stage_event(&insight, ItemEvent::InsightSucceeded, ItemEvent::InsightFailed));
        result.record_insight(insight);

        let Some(insight) = insight_value else {
            return;
        };

        advance(machine, ItemEvent::StartGenerate);
        let generate = self.run_generate(item, &insight, metrics).await;
        let content = generate.value.clone();
        advance(machine, stage_event(&generate, ItemEvent::GenerateSucceeded, ItemEvent::GenerateFailed));
        result.record_generate(generate);

        let Some(content) = content else {
            return;
        };

        let selections = self.select_candidates(item, &content, ledger, metrics);
        result.record_selections(selections.clone());

        advance(machine, ItemEvent::StartDeliver);
        let deliver = self.run_deliver(item, content, selections, metrics).await;
        advance(machine, stage_event(&deliver, ItemEvent::DeliverSucceeded, ItemEvent::DeliverFailed));
        result.record_deliver(deliver);
    }

    async fn run_insight(&self, item: &WorkItem) -> StageResult<Insight> {
        let started = Instant::now();
        let window = InsightWindow::ending_at(item.submitted_at, self.insight_lookback_hours);

        let stage = match self.collaborators.insight.fetch(&item.tenant_id, window).await {
            Ok(insight) => StageResult::succeeded(StageKind::Insight, insight, CacheStatus::Bypassed, 1),
            Err(error) => StageResult::failed(
                StageKind::Insight,
                error.into_pipeline_error(StageKind::Insight.as_str(), 1),
                CacheStatus::Bypassed,
            ),
        }
        .with_elapsed_ms(elapsed_ms(started));

        log_stage(&item.id, &stage);
        stage
    }

    async fn run_generate(
        &self,
        item: &WorkItem,
        insight: &Insight,
        metrics: &BatchMetrics,
    ) -> StageResult<Content> {
        let started = Instant::now();
        let key = generation_cache_key(item);

        if let Some(content) = self.cache.get(&key) {
            metrics.record_cache_hit();
            debug!(item_id = %item.id, tenant_id = %item.tenant_id, "💾 CACHE: Generation served from cache");
            let stage = StageResult::succeeded(StageKind::Generate, content, CacheStatus::Hit, 0)
                .with_elapsed_ms(elapsed_ms(started));
            log_stage(&item.id, &stage);
            return stage;
        }
        metrics.record_cache_miss();

        if !self.rate_limiter.try_acquire(&item.tenant_id) {
            metrics.record_rate_limited();
            let stage = StageResult::failed(
                StageKind::Generate,
                PipelineError::RateLimited {
                    identity: item.tenant_id.clone(),
                },
                CacheStatus::Miss,
            )
            .with_elapsed_ms(elapsed_ms(started));
            log_stage(&item.id, &stage);
            return stage;
        }

        let prompt = Prompt::for_item(item, insight);
        let outcome = self
            .generate_retry
            .execute(
                |attempt| {
                    metrics.record_generator_call();
                    self.generate_once(&prompt, attempt)
                },
                self.classifier.as_ref(),
            )
            .await;

        let stage = match outcome {
            Ok(success) => {
                metrics.record_attempts(success.attempts);
                self.cache.set(key, success.value.clone(), self.cache_ttl);
                StageResult::succeeded(
                    StageKind::Generate,
                    success.value,
                    CacheStatus::Miss,
                    success.attempts,
                )
            }
            Err(failure) => {
                metrics.record_attempts(failure.attempts);
                StageResult::failed(
                    StageKind::Generate,
                    failure
                        .error
                        .into_pipeline_error(StageKind::Generate.as_str(), failure.attempts),
                    CacheStatus::Miss,
                )
            }
        }
        .with_elapsed_ms(elapsed_ms(started));

        log_stage(&item.id, &stage);
        stage
    }

    async fn generate_once(&self, prompt: &Prompt, attempt: u32) -> Result<Content, ExternalError> {
        let call = self.collaborators.generator.generate(prompt);
        match self.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
                Err(ExternalError::Timeout(format!(
                    "generate attempt {attempt} exceeded {}ms",
                    limit.as_millis()
                )))
            }),
            None => call.await,
        }
    }

    /// Rank the generated candidates, skipping ids another item of the batch holds
    fn select_candidates(
        &self,
        item: &WorkItem,
        content: &Content,
        ledger: &SelectionLedger,
        metrics: &BatchMetrics,
    ) -> Vec<RankedCandidate> {
        if content.candidates.is_empty() {
            return Vec::new();
        }
        let default_criteria = RankingCriteria::default();
        let criteria = item.payload.criteria.as_ref().unwrap_or(&default_criteria);

        let mut withheld = 0_u64;
        let selections = self.ranker.rank_where(&content.candidates, criteria, |candidate| {
            let claimed = ledger.claim(&candidate.id);
            if !claimed {
                withheld += 1;
            }
            claimed
        });

        if withheld > 0 {
            metrics.record_duplicates_prevented(withheld);
            debug!(
                item_id = %item.id,
                withheld = withheld,
                selected = selections.len(),
                "🏅 RANKING: Withheld candidates already selected in this batch"
            );
        }
        selections
    }

    async fn run_deliver(
        &self,
        item: &WorkItem,
        content: Content,
        selections: Vec<RankedCandidate>,
        metrics: &BatchMetrics,
    ) -> StageResult<Receipt> {
        let started = Instant::now();
        let deliverable = Deliverable {
            item_id: item.id.clone(),
            tenant_id: item.tenant_id.clone(),
            content,
            selections,
        };
        let target = DeliveryTarget {
            tenant_id: item.tenant_id.clone(),
            destination: item.payload.destination.clone(),
        };

        // re-publishes reuse the already generated content, never regenerating it
        let outcome = self
            .deliver_retry
            .execute(
                |_| self.collaborators.deliverer.publish(&deliverable, &target),
                self.classifier.as_ref(),
            )
            .await;

        let stage = match outcome {
            Ok(success) => {
                metrics.record_attempts(success.attempts);
                StageResult::succeeded(
                    StageKind::Deliver,
                    success.value,
                    CacheStatus::Bypassed,
                    success.attempts,
                )
            }
            Err(failure) => {
                metrics.record_attempts(failure.attempts);
                StageResult::failed(
                    StageKind::Deliver,
                    failure
                        .error
                        .into_pipeline_error(StageKind::Deliver.as_str(), failure.attempts),
                    CacheStatus::Bypassed,
                )
            }
        }
        .with_elapsed_ms(elapsed_ms(started));

        log_stage(&item.id, &stage);
        stage
    }
}

impl std::fmt::Debug for StageExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageExecutor")
            .field("cache_ttl", &self.cache_ttl)
            .field("attempt_timeout", &self.attempt_timeout)
            .field("generate_policy", self.generate_retry.policy())
            .field("deliver_policy", self.deliver_retry.policy())
            .finish_non_exhaustive()
    }
}

fn advance(machine: &mut ItemStateMachine, event: ItemEvent) {
    if let Err(error) = machine.transition(event) {
        warn!(item_id = %machine.item_id(), error = %error, "Rejected item state transition");
    }
}

fn stage_event<T>(
    stage: &StageResult<T>,
    succeeded: ItemEvent,
    failed: fn(String) -> ItemEvent,
) -> ItemEvent {
    match &stage.error {
        None if stage.success => succeeded,
        Some(error) => failed(error.to_string()),
        None => failed("stage reported failure without an error".to_string()),
    }
}

fn log_stage<T>(item_id: &str, stage: &StageResult<T>) {
    let status = if stage.success { "ok" } else { "failed" };
    let details = stage.error.as_ref().map(ToString::to_string);
    log_stage_operation(
        stage.stage.as_str(),
        item_id,
        status,
        stage.attempt,
        stage.elapsed_ms,
        details.as_deref(),
    );
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::OverallStatus;
    use crate::models::{Candidate, WorkPayload};
    use crate::orchestration::collaborators::{Deliverer, Generator, InsightSource};
    use crate::resilience::NoJitter;
    use crate::state_machine::ItemState;
    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StaticInsight;

    #[async_trait]
    impl InsightSource for StaticInsight {
        async fn fetch(&self, _tenant_id: &str, _window: InsightWindow) -> Result<Insight, ExternalError> {
            Ok(Insight {
                summary: "steady".into(),
                ..Default::default()
            })
        }
    }

    /// Pops scripted outcomes, then succeeds
    #[derive(Default)]
    struct ScriptedGenerator {
        script: Mutex<VecDeque<ExternalError>>,
        calls: AtomicU32,
        delay: Option<Duration>,
        panic_with: Option<&'static str>,
    }

    #[async_trait]
    impl Generator for ScriptedGenerator {
        async fn generate(&self, prompt: &Prompt) -> Result<Content, ExternalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(message) = self.panic_with {
                panic!("{message}");
            }
            if let Some(error) = self.script.lock().pop_front() {
                return Err(error);
            }
            Ok(Content::text(format!("copy for {}", prompt.subject)).with_candidates(vec![
                Candidate::new("low", 0.1, 0.1),
                Candidate::new("high", 0.9, 0.9),
            ]))
        }
    }

    #[derive(Default)]
    struct ScriptedDeliverer {
        script: Mutex<VecDeque<ExternalError>>,
        published: Mutex<Vec<Deliverable>>,
    }

    #[async_trait]
    impl Deliverer for ScriptedDeliverer {
        async fn publish(
            &self,
            deliverable: &Deliverable,
            _target: &DeliveryTarget,
        ) -> Result<Receipt, ExternalError> {
            if let Some(error) = self.script.lock().pop_front() {
                return Err(error);
            }
            self.published.lock().push(deliverable.clone());
            Ok(Receipt {
                delivery_id: format!("d-{}", deliverable.item_id),
                delivered_at: Utc::now(),
            })
        }
    }

    fn executor_with(
        config: PipelineConfig,
        generator: Arc<ScriptedGenerator>,
        deliverer: Arc<ScriptedDeliverer>,
    ) -> StageExecutor {
        let retry = RetryExecutor::new(RetryPolicy::from_config(&config.retry), Arc::new(NoJitter));
        StageExecutor::new(
            &config,
            Collaborators::new(Arc::new(StaticInsight), generator, deliverer),
            Arc::new(TtlCache::new(config.cache.capacity)),
            Arc::new(FixedWindowRateLimiter::from_config(&config.rate_limit)),
            retry,
        )
    }

    async fn run(executor: &StageExecutor, item: &WorkItem, ordinal: usize, metrics: &BatchMetrics) -> PipelineResult {
        executor
            .execute(item, ordinal, 0, metrics, &SelectionLedger::disabled())
            .await
    }

    fn item(id: &str) -> WorkItem {
        WorkItem::new(id, "tenant-a", WorkPayload::new("autumn launch")).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_then_cache_hit() {
        let generator = Arc::new(ScriptedGenerator::default());
        let deliverer = Arc::new(ScriptedDeliverer::default());
        let executor = executor_with(PipelineConfig::default(), generator.clone(), deliverer.clone());
        let metrics = BatchMetrics::new();

        let first = run(&executor, &item("a"), 0, &metrics).await;
        assert_eq!(first.overall_status, OverallStatus::Success);
        assert_eq!(first.generate_cache_status(), Some(CacheStatus::Miss));

        let second = run(&executor, &item("b"), 1, &metrics).await;
        assert_eq!(second.generate_cache_status(), Some(CacheStatus::Hit));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.cache_hits(), 1);

        // ranked selections travel with the deliverable
        let published = deliverer.published.lock();
        assert_eq!(published[0].selections[0].candidate.id, "high");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_failures_then_success_reports_attempts() {
        let generator = Arc::new(ScriptedGenerator::default());
        generator.script.lock().extend([
            ExternalError::Unavailable("503".into()),
            ExternalError::RateLimited("429".into()),
        ]);
        let executor = executor_with(
            PipelineConfig::default(),
            generator.clone(),
            Arc::new(ScriptedDeliverer::default()),
        );

        let result = run(&executor, &item("a"), 0, &BatchMetrics::new()).await;
        assert_eq!(result.overall_status, OverallStatus::Success);
        assert_eq!(result.generate.as_ref().unwrap().attempt, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_denial_skips_generator() {
        let mut config = PipelineConfig::default();
        config.rate_limit.max_per_window = 1;
        let generator = Arc::new(ScriptedGenerator::default());
        let executor = executor_with(config, generator.clone(), Arc::new(ScriptedDeliverer::default()));
        let metrics = BatchMetrics::new();

        let a = WorkItem::new("a", "tenant-a", WorkPayload::new("one")).unwrap();
        let b = WorkItem::new("b", "tenant-a", WorkPayload::new("two")).unwrap();
        run(&executor, &a, 0, &metrics).await;
        let denied = run(&executor, &b, 1, &metrics).await;

        assert_eq!(denied.overall_status, OverallStatus::Failed);
        assert_eq!(denied.first_error().map(PipelineError::code), Some("rate_limited"));
        assert!(denied.deliver.is_none());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_generate_error_is_not_retried() {
        let generator = Arc::new(ScriptedGenerator::default());
        generator
            .script
            .lock()
            .push_back(ExternalError::Fatal("content policy".into()));
        let executor = executor_with(
            PipelineConfig::default(),
            generator.clone(),
            Arc::new(ScriptedDeliverer::default()),
        );

        let result = run(&executor, &item("a"), 0, &BatchMetrics::new()).await;
        assert_eq!(result.overall_status, OverallStatus::Failed);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert!(executor.cache().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_becomes_timeout_error() {
        let mut config = PipelineConfig::default();
        config.retry.max_attempts = 2;
        config.retry.attempt_timeout_ms = Some(50);
        let generator = Arc::new(ScriptedGenerator {
            delay: Some(Duration::from_millis(200)),
            ..Default::default()
        });
        let executor = executor_with(config, generator.clone(), Arc::new(ScriptedDeliverer::default()));

        let result = run(&executor, &item("a"), 0, &BatchMetrics::new()).await;
        assert_eq!(
            result.first_error(),
            Some(&PipelineError::Timeout {
                operation: "generate".into(),
                attempts: 2
            })
        );
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deliver_failure_is_partial_and_keeps_content() {
        let deliverer = Arc::new(ScriptedDeliverer::default());
        deliverer
            .script
            .lock()
            .push_back(ExternalError::Unavailable("smtp down".into()));
        let executor = executor_with(
            PipelineConfig::default(),
            Arc::new(ScriptedGenerator::default()),
            deliverer,
        );

        let result = run(&executor, &item("a"), 0, &BatchMetrics::new()).await;
        assert_eq!(result.overall_status, OverallStatus::Partial);
        assert!(result.content().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_redelivery_policy_republishes_without_regenerating() {
        let mut config = PipelineConfig::default();
        config.delivery.redelivery = crate::config::RedeliveryPolicy::Retry { max_attempts: 3 };
        let generator = Arc::new(ScriptedGenerator::default());
        let deliverer = Arc::new(ScriptedDeliverer::default());
        deliverer
            .script
            .lock()
            .push_back(ExternalError::Unavailable("smtp down".into()));
        let executor = executor_with(config, generator.clone(), deliverer.clone());

        let result = run(&executor, &item("a"), 0, &BatchMetrics::new()).await;
        assert_eq!(result.overall_status, OverallStatus::Success);
        assert_eq!(result.deliver.as_ref().unwrap().attempt, 2);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(deliverer.published.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_stage_aborts_the_item() {
        let generator = Arc::new(ScriptedGenerator {
            panic_with: Some("generator blew up"),
            ..Default::default()
        });
        let deliverer = Arc::new(ScriptedDeliverer::default());
        let executor = executor_with(PipelineConfig::default(), generator, deliverer.clone());

        let result = run(&executor, &item("a"), 0, &BatchMetrics::new()).await;

        assert_eq!(result.overall_status, OverallStatus::Failed);
        assert_eq!(result.final_state, Some(ItemState::Failed));
        assert!(matches!(
            result.rejection,
            Some(PipelineError::WorkerPanicked { ref message }) if message == "generator blew up"
        ));
        // work done before the panic survives
        assert!(result.insight.as_ref().is_some_and(|stage| stage.success));
        assert!(result.generate.is_none());
        assert!(deliverer.published.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_item_records_terminal_state() {
        let deliverer = Arc::new(ScriptedDeliverer::default());
        deliverer
            .script
            .lock()
            .push_back(ExternalError::Fatal("bounce".into()));
        let executor = executor_with(
            PipelineConfig::default(),
            Arc::new(ScriptedGenerator::default()),
            deliverer,
        );
        let metrics = BatchMetrics::new();

        let partial = run(&executor, &item("a"), 0, &metrics).await;
        let success = run(&executor, &item("b"), 1, &metrics).await;

        assert_eq!(partial.final_state, Some(ItemState::Partial));
        assert_eq!(success.final_state, Some(ItemState::Success));
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_ledger_withholds_candidates_already_selected() {
        let executor = executor_with(
            PipelineConfig::default(),
            Arc::new(ScriptedGenerator::default()),
            Arc::new(ScriptedDeliverer::default()),
        );
        let metrics = BatchMetrics::new();
        let ledger = SelectionLedger::new(true);

        let first = executor.execute(&item("a"), 0, 0, &metrics, &ledger).await;
        let second = executor.execute(&item("b"), 1, 0, &metrics, &ledger).await;

        assert_eq!(first.selections.len(), 2);
        assert!(second.selections.is_empty());
        assert_eq!(second.overall_status, OverallStatus::Success);
        let summary = metrics.summarize(&[first, second], 0, 0, 1, 1, 0);
        assert_eq!(summary.duplicates_prevented, 2);
    }

    #[test]
    fn test_panic_message_extraction() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic payload");
    }
}
