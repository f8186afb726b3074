//! # Batch Metrics
//!
//! Lock-free counters updated by workers and stages while a batch runs. Turned into a
//! [`BatchSummary`] when the batch completes.

use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};

use crate::constants::OverallStatus;
use crate::models::{BatchSummary, PipelineResult};

#[derive(Debug, Default)]
pub struct BatchMetrics {
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    completed: AtomicUsize,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    rate_limited: AtomicU64,
    generator_calls: AtomicU64,
    retries: AtomicU64,
    duplicates_prevented: AtomicU64,
    concurrency_adjustments: AtomicU32,
    checkpoints: AtomicU32,
}

impl BatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A worker picked up an item
    pub fn item_started(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    /// A worker finished with an item, whatever the outcome
    pub fn item_finished(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_generator_call(&self) {
        self.generator_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the extra attempts of an operation that took `attempts` in total
    pub fn record_attempts(&self, attempts: u32) {
        if attempts > 1 {
            self.retries
                .fetch_add(u64::from(attempts - 1), Ordering::Relaxed);
        }
    }

    pub fn record_duplicates_prevented(&self, count: u64) {
        if count > 0 {
            self.duplicates_prevented.fetch_add(count, Ordering::Relaxed);
        }
    }

    pub fn record_adjustment(&self) {
        self.concurrency_adjustments.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_checkpoint(&self) {
        self.checkpoints.fetch_add(1, Ordering::Relaxed);
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn generator_calls(&self) -> u64 {
        self.generator_calls.load(Ordering::Relaxed)
    }

    /// Build the summary for a finished batch from these counters and its results
    pub fn summarize(
        &self,
        results: &[PipelineResult],
        rejected: usize,
        cancelled: usize,
        initial_concurrency: usize,
        final_concurrency: usize,
        elapsed_ms: u64,
    ) -> BatchSummary {
        let count = |status: OverallStatus| {
            results
                .iter()
                .filter(|r| r.overall_status == status)
                .count()
        };

        BatchSummary {
            total: results.len(),
            success: count(OverallStatus::Success),
            partial: count(OverallStatus::Partial),
            failed: count(OverallStatus::Failed),
            rejected,
            cancelled,
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            generator_calls: self.generator_calls.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            duplicates_prevented: self.duplicates_prevented.load(Ordering::Relaxed),
            initial_concurrency,
            final_concurrency,
            peak_in_flight: self.peak_in_flight(),
            concurrency_adjustments: self.concurrency_adjustments.load(Ordering::Relaxed),
            checkpoints: self.checkpoints.load(Ordering::Relaxed),
            elapsed_ms,
        }
    }
}
