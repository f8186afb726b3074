//! Configuration and request builders shared by the integration tests.

#![allow(dead_code)]

use pipeline_core::config::{ConcurrencyConfig, PipelineConfig};
use pipeline_core::models::{WorkItemRequest, WorkPayload};

/// Fixed-size pool with millisecond retries, no jitter and a generous rate limit
pub fn fast_config(workers: usize) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.concurrency = ConcurrencyConfig::fixed(workers);
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 10;
    config.retry.jitter_ms = 0;
    config.retry.seed = Some(7);
    config.rate_limit.max_per_window = 10_000;
    config
}

/// Adaptive pool: starts at `initial`, reacts after every checkpoint
pub fn adaptive_config(min: usize, max: usize, initial: usize) -> PipelineConfig {
    let mut config = fast_config(initial);
    config.concurrency = ConcurrencyConfig { min, max, initial };
    config.throttle.sample_window_size = 1;
    config.throttle.latency_budget_ms = 10_000;
    config
}

pub fn request(id: &str, tenant: &str, subject: &str) -> WorkItemRequest {
    WorkItemRequest::new(tenant, WorkPayload::new(subject).with_destination(format!("{tenant}@example.com")))
        .with_id(id)
}

/// `count` requests for one tenant with distinct subjects
pub fn numbered_requests(count: usize, tenant: &str) -> Vec<WorkItemRequest> {
    (0..count)
        .map(|i| request(&format!("item-{i:03}"), tenant, &format!("subject {i}")))
        .collect()
}
