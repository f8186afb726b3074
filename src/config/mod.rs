//! # Pipeline Configuration System
//!
//! Typed configuration for the batch pipeline. Every section has compiled-in
//! defaults; [`ConfigManager`] layers an optional file and `PIPELINE_*`
//! environment variables on top and validates the result.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pipeline_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load(Some("config/pipeline.toml".as_ref()))?;
//! let config = manager.config();
//! println!("max concurrency: {}", config.concurrency.max);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{defaults, limits};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker pool sizing bounds
    pub concurrency: ConcurrencyConfig,

    /// Generation result cache
    pub cache: CacheConfig,

    /// Per-tenant fixed-window rate limiting
    pub rate_limit: RateLimitConfig,

    /// Retry policy for external generation calls
    pub retry: RetryConfig,

    /// Adaptive concurrency controller
    pub throttle: ThrottleConfig,

    /// Delivery stage behaviour
    pub delivery: DeliveryConfig,

    /// Insight stage behaviour
    pub insight: InsightConfig,

    /// Candidate selection across the items of a batch
    pub selection: SelectionConfig,
}

impl PipelineConfig {
    /// Validate cross-field invariants. Called by the loader and the orchestrator.
    pub fn validate(&self) -> ConfigResult<()> {
        self.concurrency.validate()?;
        self.cache.validate()?;
        self.rate_limit.validate()?;
        self.retry.validate()?;
        self.throttle.validate()?;
        self.delivery.validate()?;
        self.insight.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    pub min: usize,
    pub max: usize,
    pub initial: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            min: defaults::MIN_CONCURRENCY,
            max: defaults::MAX_CONCURRENCY,
            initial: defaults::INITIAL_CONCURRENCY,
        }
    }
}

impl ConcurrencyConfig {
    /// Fixed pool: `min == max == initial == workers`
    pub fn fixed(workers: usize) -> Self {
        Self {
            min: workers,
            max: workers,
            initial: workers,
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.min == 0 {
            return Err(ConfigurationError::invalid_value(
                "concurrency.min",
                self.min,
                "must be at least 1",
            ));
        }
        if self.min > self.max {
            return Err(ConfigurationError::invalid_value(
                "concurrency.max",
                self.max,
                format!("must be >= concurrency.min ({})", self.min),
            ));
        }
        if !(self.min..=self.max).contains(&self.initial) {
            return Err(ConfigurationError::invalid_value(
                "concurrency.initial",
                self.initial,
                format!("must lie within [{}, {}]", self.min, self.max),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_ms: u64,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: defaults::CACHE_TTL_MS,
            capacity: defaults::CACHE_CAPACITY,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "cache.capacity",
                self.capacity,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Fixed-window limits. A burst of up to 2x `max_per_window` is possible across a
/// window boundary.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub window_ms: u64,
    pub max_per_window: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: defaults::RATE_LIMIT_WINDOW_MS,
            max_per_window: defaults::RATE_LIMIT_MAX_PER_WINDOW,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.window_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "rate_limit.window_ms",
                self.window_ms,
                "must be at least 1",
            ));
        }
        if self.max_per_window == 0 {
            return Err(ConfigurationError::invalid_value(
                "rate_limit.max_per_window",
                self.max_per_window,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    /// Upper bound of the uniform random jitter added to each delay
    pub jitter_ms: u64,
    /// Cap applied to the exponential part of the delay
    pub max_delay_ms: u64,
    /// Optional bound on each individual external attempt
    pub attempt_timeout_ms: Option<u64>,
    /// Seed for the jitter source; `None` seeds from OS entropy
    pub seed: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::RETRY_MAX_ATTEMPTS,
            base_delay_ms: defaults::RETRY_BASE_DELAY_MS,
            jitter_ms: defaults::RETRY_JITTER_MS,
            max_delay_ms: defaults::RETRY_MAX_DELAY_MS,
            attempt_timeout_ms: None,
            seed: None,
        }
    }
}

impl RetryConfig {
    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout_ms.map(Duration::from_millis)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.max_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "retry.max_attempts",
                self.max_attempts,
                "must be at least 1",
            ));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(ConfigurationError::invalid_value(
                "retry.max_delay_ms",
                self.max_delay_ms,
                format!("must be >= retry.base_delay_ms ({})", self.base_delay_ms),
            ));
        }
        if self.attempt_timeout_ms == Some(0) {
            return Err(ConfigurationError::invalid_value(
                "retry.attempt_timeout_ms",
                0,
                "must be positive when set",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Capacity of the usage sample ring buffer
    pub sample_window_size: usize,
    /// Mean usage (0-100) above which concurrency is reduced
    pub high_watermark: f64,
    /// Mean usage (0-100) below which concurrency is increased
    pub low_watermark: f64,
    /// Mean item latency that maps to 100% usage
    pub latency_budget_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            sample_window_size: defaults::THROTTLE_SAMPLE_WINDOW,
            high_watermark: defaults::THROTTLE_HIGH_WATERMARK,
            low_watermark: defaults::THROTTLE_LOW_WATERMARK,
            latency_budget_ms: defaults::THROTTLE_LATENCY_BUDGET_MS,
        }
    }
}

impl ThrottleConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.sample_window_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "throttle.sample_window_size",
                self.sample_window_size,
                "must be at least 1",
            ));
        }
        if !(0.0..=100.0).contains(&self.low_watermark)
            || !(0.0..=100.0).contains(&self.high_watermark)
        {
            return Err(ConfigurationError::invalid_value(
                "throttle",
                format!("low={} high={}", self.low_watermark, self.high_watermark),
                "watermarks must lie within [0, 100]",
            ));
        }
        if self.low_watermark >= self.high_watermark {
            return Err(ConfigurationError::invalid_value(
                "throttle.low_watermark",
                self.low_watermark,
                format!("must be < throttle.high_watermark ({})", self.high_watermark),
            ));
        }
        if self.latency_budget_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "throttle.latency_budget_ms",
                0,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// What to do when Deliver fails after Generate succeeded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RedeliveryPolicy {
    /// Single delivery attempt; a failure leaves the item `Partial`
    #[default]
    Disabled,
    /// Re-publish the already generated content up to `max_attempts` times in total
    Retry { max_attempts: u32 },
}

impl RedeliveryPolicy {
    pub fn max_attempts(&self) -> u32 {
        match self {
            Self::Disabled => 1,
            Self::Retry { max_attempts } => (*max_attempts).max(1),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub redelivery: RedeliveryPolicy,
}

impl DeliveryConfig {
    fn validate(&self) -> ConfigResult<()> {
        if let RedeliveryPolicy::Retry { max_attempts: 0 } = self.redelivery {
            return Err(ConfigurationError::invalid_value(
                "delivery.redelivery.max_attempts",
                0,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InsightConfig {
    /// How far back from `submitted_at` the insight window reaches
    pub lookback_hours: u32,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            lookback_hours: defaults::INSIGHT_LOOKBACK_HOURS,
        }
    }
}

impl InsightConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.lookback_hours > limits::MAX_INSIGHT_LOOKBACK_HOURS {
            return Err(ConfigurationError::invalid_value(
                "insight.lookback_hours",
                self.lookback_hours,
                format!("must be at most {}", limits::MAX_INSIGHT_LOOKBACK_HOURS),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Never hand the same candidate id to two items of one batch
    pub dedupe_across_batch: bool,
}
