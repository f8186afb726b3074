//! # Pipeline Result
//!
//! One [`PipelineResult`] exists per submitted request. It is created when the item is
//! enqueued, filled stage by stage by the single worker that owns the item, appended
//! once to the result sink, and not modified afterwards.

use serde::{Deserialize, Serialize};

use crate::constants::{CacheStatus, OverallStatus};
use crate::error::PipelineError;
use crate::models::artifacts::{Content, Insight, Receipt};
use crate::models::candidate::RankedCandidate;
use crate::models::stage_result::StageResult;
use crate::state_machine::ItemState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub item_id: String,
    pub tenant_id: String,
    /// Position of the request in the submitted batch
    pub ordinal: usize,
    pub insight: Option<StageResult<Insight>>,
    pub generate: Option<StageResult<Content>>,
    pub deliver: Option<StageResult<Receipt>>,
    /// Ranked candidates handed to the deliverer
    #[serde(default)]
    pub selections: Vec<RankedCandidate>,
    /// Item-level error for items that never reached a stage (validation, cancellation, panic)
    pub rejection: Option<PipelineError>,
    pub overall_status: OverallStatus,
    pub elapsed_ms: u64,
    /// Worker that processed the item, if any did
    pub worker_id: Option<usize>,
    /// Terminal state of the item's state machine; `None` if no worker ran it
    #[serde(default)]
    pub final_state: Option<ItemState>,
}

impl PipelineResult {
    /// Fresh result for an enqueued item; `Failed` until stages are recorded
    pub fn pending(item_id: impl Into<String>, tenant_id: impl Into<String>, ordinal: usize) -> Self {
        Self {
            item_id: item_id.into(),
            tenant_id: tenant_id.into(),
            ordinal,
            insight: None,
            generate: None,
            deliver: None,
            selections: Vec::new(),
            rejection: None,
            overall_status: OverallStatus::Failed,
            elapsed_ms: 0,
            worker_id: None,
            final_state: None,
        }
    }

    /// Result for an item that was never processed
    pub fn rejected(
        item_id: impl Into<String>,
        tenant_id: impl Into<String>,
        ordinal: usize,
        error: PipelineError,
    ) -> Self {
        let mut result = Self::pending(item_id, tenant_id, ordinal);
        result.rejection = Some(error);
        result
    }

    pub fn record_insight(&mut self, stage: StageResult<Insight>) {
        self.insight = Some(stage);
    }

    pub fn record_generate(&mut self, stage: StageResult<Content>) {
        self.generate = Some(stage);
    }

    pub fn record_deliver(&mut self, stage: StageResult<Receipt>) {
        self.deliver = Some(stage);
    }

    pub fn record_selections(&mut self, selections: Vec<RankedCandidate>) {
        self.selections = selections;
    }

    pub fn record_final_state(&mut self, state: ItemState) {
        self.final_state = Some(state);
    }

    /// Derive `overall_status` from the recorded stages and stamp timing/worker
    pub fn finalize(mut self, elapsed_ms: u64, worker_id: Option<usize>) -> Self {
        self.overall_status = if self.rejection.is_some() {
            OverallStatus::Failed
        } else {
            OverallStatus::from_stages(
                self.insight.as_ref().map(|s| s.success),
                self.generate.as_ref().map(|s| s.success),
                self.deliver.as_ref().map(|s| s.success),
            )
        };
        self.elapsed_ms = elapsed_ms;
        self.worker_id = worker_id;
        self
    }

    /// Generated content, kept for `Partial` results as well
    pub fn content(&self) -> Option<&Content> {
        self.generate.as_ref().and_then(|s| s.value.as_ref())
    }

    pub fn generate_cache_status(&self) -> Option<CacheStatus> {
        self.generate.as_ref().map(|s| s.cache_status)
    }

    /// First error encountered while processing this item
    pub fn first_error(&self) -> Option<&PipelineError> {
        self.rejection
            .as_ref()
            .or_else(|| self.insight.as_ref().and_then(|s| s.error.as_ref()))
            .or_else(|| self.generate.as_ref().and_then(|s| s.error.as_ref()))
            .or_else(|| self.deliver.as_ref().and_then(|s| s.error.as_ref()))
    }
}
