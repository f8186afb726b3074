//! # Batch Summary
//!
//! Aggregate counters for one `run_batch` call. Built from the orchestrator's live
//! metrics once every worker has exited.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Requests submitted, including rejected ones
    pub total: usize,
    pub success: usize,
    pub partial: usize,
    pub failed: usize,
    /// Requests rejected by validation before enqueue
    pub rejected: usize,
    /// Items reported `Cancelled` because a stop was requested before they started
    pub cancelled: usize,

    // Generate stage
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Calls denied by the local rate limiter
    pub rate_limited: u64,
    /// External generation attempts, retries included
    pub generator_calls: u64,
    /// Attempts beyond the first across all retried operations
    pub retries: u64,

    /// Candidates withheld because another item of the batch already selected them
    #[serde(default)]
    pub duplicates_prevented: u64,

    // Concurrency
    pub initial_concurrency: usize,
    pub final_concurrency: usize,
    pub peak_in_flight: usize,
    /// Number of times the worker budget was changed
    pub concurrency_adjustments: u32,
    pub checkpoints: u32,

    pub elapsed_ms: u64,
}

impl BatchSummary {
    /// Fraction (0.0 - 1.0) of submitted items that fully succeeded
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.success as f64 / self.total as f64
        }
    }

    /// Fraction of Generate cache lookups that were served from the cache
    pub fn cache_hit_rate(&self) -> f64 {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / lookups as f64
        }
    }
}
