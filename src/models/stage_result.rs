use serde::{Deserialize, Serialize};

use crate::constants::{CacheStatus, StageKind};
use crate::error::PipelineError;

/// Outcome of one stage for one item. Produced exactly once per executed stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult<T> {
    pub stage: StageKind,
    pub success: bool,
    pub value: Option<T>,
    pub error: Option<PipelineError>,
    pub cache_status: CacheStatus,
    /// External attempts made by this stage (0 when served from cache or denied locally)
    pub attempt: u32,
    pub elapsed_ms: u64,
}

impl<T> StageResult<T> {
    pub fn succeeded(stage: StageKind, value: T, cache_status: CacheStatus, attempt: u32) -> Self {
        Self {
            stage,
            success: true,
            value: Some(value),
            error: None,
            cache_status,
            attempt,
            elapsed_ms: 0,
        }
    }

    pub fn failed(stage: StageKind, error: PipelineError, cache_status: CacheStatus) -> Self {
        let attempt = error.attempts();
        Self {
            stage,
            success: false,
            value: None,
            error: Some(error),
            cache_status,
            attempt,
            elapsed_ms: 0,
        }
    }

    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    pub fn is_cache_hit(&self) -> bool {
        self.cache_status == CacheStatus::Hit
    }

    pub fn error_code(&self) -> Option<&'static str> {
        self.error.as_ref().map(PipelineError::code)
    }
}
