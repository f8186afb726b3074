//! # Pipeline Data Model
//!
//! Work items flow in, [`PipelineResult`]s flow out. Everything here is plain data:
//! serializable, cloneable and free of I/O.

pub mod artifacts;
pub mod batch_summary;
pub mod candidate;
pub mod pipeline_result;
pub mod stage_result;
pub mod work_item;

pub use artifacts::{Content, Deliverable, DeliveryTarget, Insight, InsightWindow, Prompt, Receipt};
pub use batch_summary::BatchSummary;
pub use candidate::{
    Candidate, CandidateFeatures, CategoryMatch, NumericTarget, RankedCandidate, RankingCriteria,
};
pub use pipeline_result::PipelineResult;
pub use stage_result::StageResult;
pub use work_item::{WorkItem, WorkItemRequest, WorkPayload};
