//! # Orchestration Engine
//!
//! Batch execution core: a bounded worker pool drives each work item through the
//! Insight, Generate and Deliver stages and collects exactly one result per item.
//!
//! ## Core Components
//!
//! - **PipelineOrchestrator**: owns the queue, worker pool, cache, rate limiter and throttle
//! - **StageExecutor**: per-item stage sequencing with caching, rate limiting and retries
//! - **AdaptiveThrottle**: resizes the worker budget from rolling usage samples
//! - **ResultSink**: synchronized, append-only result collection
//! - **SelectionLedger**: optional batch-wide claim on selected candidate ids
//! - **Collaborators**: capability traits for the external services
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pipeline_core::config::PipelineConfig;
//! use pipeline_core::models::{WorkItemRequest, WorkPayload};
//! use pipeline_core::orchestration::{Collaborators, PipelineOrchestrator};
//!
//! # async fn example(collaborators: Collaborators) -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = PipelineOrchestrator::new(PipelineConfig::default(), collaborators)?;
//! let outcome = orchestrator
//!     .run_batch(vec![WorkItemRequest::new("tenant-a", WorkPayload::new("spring menu"))])
//!     .await;
//! for result in outcome.in_submission_order() {
//!     println!("{} -> {}", result.item_id, result.overall_status);
//! }
//! # Ok(())
//! # }
//! ```

pub mod adaptive_throttle;
pub mod collaborators;
pub mod metrics;
pub mod orchestrator;
pub mod result_sink;
pub mod selection_ledger;
pub mod shutdown;
pub mod stage_executor;

pub use adaptive_throttle::{AdaptiveThrottle, ThrottleSample};
pub use collaborators::{Collaborators, Deliverer, Generator, InsightSource};
pub use metrics::BatchMetrics;
pub use orchestrator::{BatchOutcome, PipelineOrchestrator};
pub use result_sink::ResultSink;
pub use selection_ledger::SelectionLedger;
pub use shutdown::ShutdownHandle;
pub use stage_executor::{GenerationCache, StageExecutor};
