//! # Adaptive Throttle
//!
//! Rolling usage samples (0-100) drive a one-step-at-a-time concurrency adjustment.
//! The orchestrator records one sample per checkpoint of completed items rather than
//! per item, which keeps the budget from oscillating.

use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::{ConcurrencyConfig, ThrottleConfig};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrottleSample {
    pub timestamp: Instant,
    /// Clamped to `[0, 100]`
    pub usage: f64,
}

#[derive(Debug)]
pub struct AdaptiveThrottle {
    capacity: usize,
    high_watermark: f64,
    low_watermark: f64,
    min_concurrency: usize,
    max_concurrency: usize,
    samples: Mutex<VecDeque<ThrottleSample>>,
}

impl AdaptiveThrottle {
    pub fn new(throttle: &ThrottleConfig, concurrency: &ConcurrencyConfig) -> Self {
        info!(
            "🎛️ THROTTLE: Creating adaptive throttle (window: {}, low: {:.1}, high: {:.1}, range: {}..={})",
            throttle.sample_window_size,
            throttle.low_watermark,
            throttle.high_watermark,
            concurrency.min,
            concurrency.max
        );

        let capacity = throttle.sample_window_size.max(1);
        Self {
            capacity,
            high_watermark: throttle.high_watermark,
            low_watermark: throttle.low_watermark,
            min_concurrency: concurrency.min.max(1),
            max_concurrency: concurrency.max.max(concurrency.min.max(1)),
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Append a usage sample, dropping the oldest beyond capacity
    pub fn record_sample(&self, usage: f64) {
        let usage = if usage.is_finite() {
            usage.clamp(0.0, 100.0)
        } else {
            100.0
        };

        let mut samples = self.samples.lock();
        if samples.len() == self.capacity {
            samples.pop_front();
        }
        samples.push_back(ThrottleSample {
            timestamp: Instant::now(),
            usage,
        });
    }

    pub fn mean_usage(&self) -> Option<f64> {
        let samples = self.samples.lock();
        if samples.is_empty() {
            return None;
        }
        Some(samples.iter().map(|s| s.usage).sum::<f64>() / samples.len() as f64)
    }

    /// Next concurrency budget given the current one. Moves at most one step.
    pub fn next_concurrency(&self, current: usize) -> usize {
        let current = current.clamp(self.min_concurrency, self.max_concurrency);
        let Some(mean) = self.mean_usage() else {
            return current;
        };

        let next = if mean > self.high_watermark && current > self.min_concurrency {
            current - 1
        } else if mean < self.low_watermark && current < self.max_concurrency {
            current + 1
        } else {
            current
        };

        if next != current {
            debug!(
                "SCALING: mean usage {:.1}% moves concurrency {} -> {}",
                mean, current, next
            );
        }
        next
    }

    pub fn sample_count(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn samples(&self) -> Vec<ThrottleSample> {
        self.samples.lock().iter().copied().collect()
    }

    pub fn clear(&self) {
        self.samples.lock().clear();
    }

    pub fn bounds(&self) -> (usize, usize) {
        (self.min_concurrency, self.max_concurrency)
    }

    /// Usage for one checkpoint: the worse of error rate and latency pressure, as a percentage
    pub fn usage_from(error_rate: f64, mean_latency_ms: f64, latency_budget_ms: u64) -> f64 {
        let latency_pressure = if latency_budget_ms == 0 {
            1.0
        } else {
            mean_latency_ms / latency_budget_ms as f64
        };
        (100.0 * error_rate.max(latency_pressure)).clamp(0.0, 100.0)
    }
}
