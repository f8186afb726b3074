//! # Pipeline Constants
//!
//! Status enums shared across the pipeline and the compiled-in defaults used by
//! [`PipelineConfig`](crate::config::PipelineConfig).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal outcome of one work item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    /// Insight, Generate and Deliver all succeeded
    Success,
    /// Insight and Generate succeeded, Deliver failed. The generated output is kept.
    Partial,
    /// Insight or Generate failed, or the item never ran
    Failed,
}

impl OverallStatus {
    /// Derive the overall status from the three stage outcomes.
    ///
    /// `None` means the stage never ran.
    pub fn from_stages(insight: Option<bool>, generate: Option<bool>, deliver: Option<bool>) -> Self {
        match (insight, generate, deliver) {
            (Some(true), Some(true), Some(true)) => Self::Success,
            (Some(true), Some(true), _) => Self::Partial,
            _ => Self::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "Success"),
            Self::Partial => write!(f, "Partial"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// The three pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Insight,
    Generate,
    Deliver,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insight => "insight",
            Self::Generate => "generate",
            Self::Deliver => "deliver",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a stage was served from the generation cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    Hit,
    Miss,
    /// Stage does not consult the cache (Insight, Deliver)
    Bypassed,
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hit => write!(f, "hit"),
            Self::Miss => write!(f, "miss"),
            Self::Bypassed => write!(f, "bypassed"),
        }
    }
}

/// Compiled-in configuration defaults
pub mod defaults {
    pub const MIN_CONCURRENCY: usize = 1;
    pub const MAX_CONCURRENCY: usize = 8;
    pub const INITIAL_CONCURRENCY: usize = 4;

    pub const CACHE_TTL_MS: u64 = 300_000;
    pub const CACHE_CAPACITY: usize = 1_024;

    pub const RATE_LIMIT_WINDOW_MS: u64 = 60_000;
    pub const RATE_LIMIT_MAX_PER_WINDOW: u32 = 60;

    pub const RETRY_MAX_ATTEMPTS: u32 = 3;
    pub const RETRY_BASE_DELAY_MS: u64 = 500;
    pub const RETRY_JITTER_MS: u64 = 250;
    pub const RETRY_MAX_DELAY_MS: u64 = 30_000;

    pub const THROTTLE_SAMPLE_WINDOW: usize = 10;
    pub const THROTTLE_HIGH_WATERMARK: f64 = 80.0;
    pub const THROTTLE_LOW_WATERMARK: f64 = 30.0;
    pub const THROTTLE_LATENCY_BUDGET_MS: u64 = 2_000;

    pub const INSIGHT_LOOKBACK_HOURS: u32 = 24;
}

/// Limits applied when validating incoming work items
pub mod limits {
    pub const MAX_ITEM_ID_LENGTH: usize = 128;
    pub const MAX_TENANT_ID_LENGTH: usize = 128;
    pub const MAX_SUBJECT_LENGTH: usize = 4_096;
    /// Ten years
    pub const MAX_INSIGHT_LOOKBACK_HOURS: u32 = 24 * 365 * 10;
}
