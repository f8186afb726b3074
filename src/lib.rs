#![allow(clippy::doc_markdown)] // Allow technical terms in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Pipeline Core
//!
//! Batch-processing core that drives many independent work items through a
//! three-stage pipeline: insight gathering, generation, and delivery.
//!
//! ## Overview
//!
//! The generation stage calls an expensive, rate-limited and occasionally unreliable
//! external service. The core keeps that call under control:
//!
//! - **Bounded concurrency**: a worker pool whose size adapts to observed load
//! - **Shared TTL/LRU cache**: equivalent requests are generated once
//! - **Per-tenant rate limiting**: fixed-window counters in front of the generator
//! - **Retries**: exponential backoff with seedable jitter for retryable failures
//! - **Partial-failure reporting**: one result per item; a failed delivery keeps the
//!   generated content
//! - **Candidate ranking**: deterministic scoring of generated candidates
//!
//! ## Module Organization
//!
//! - [`orchestration`] - Worker pool, stage execution, adaptive throttle, collaborators
//! - [`cache`] - TTL cache and cache key derivation
//! - [`resilience`] - Rate limiter, retry executor, error classification
//! - [`services`] - Candidate ranking
//! - [`state_machine`] - Per-item stage state machine
//! - [`models`] - Work items, stage and pipeline results, batch summary
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Error taxonomy
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pipeline_core::config::ConfigManager;
//! use pipeline_core::models::{WorkItemRequest, WorkPayload};
//! use pipeline_core::orchestration::{Collaborators, PipelineOrchestrator};
//!
//! # async fn example(collaborators: Collaborators) -> Result<(), Box<dyn std::error::Error>> {
//! pipeline_core::logging::init_structured_logging();
//!
//! let manager = ConfigManager::load(None)?;
//! let orchestrator = PipelineOrchestrator::new(manager.config().clone(), collaborators)?;
//!
//! let outcome = orchestrator
//!     .run_batch(vec![
//!         WorkItemRequest::new("tenant-a", WorkPayload::new("spring menu")),
//!         WorkItemRequest::new("tenant-b", WorkPayload::new("store opening")),
//!     ])
//!     .await;
//!
//! println!("success rate: {:.1}%", outcome.summary.success_rate() * 100.0);
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit and integration tests
//! ```

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod resilience;
pub mod services;
pub mod state_machine;

pub use cache::{CacheStats, TtlCache};
pub use config::{ConfigManager, PipelineConfig, RedeliveryPolicy};
pub use constants::{CacheStatus, OverallStatus, StageKind};
pub use error::{ExternalError, PipelineError, Result};
pub use models::{
    BatchSummary, Candidate, PipelineResult, RankedCandidate, RankingCriteria, StageResult,
    WorkItem, WorkItemRequest, WorkPayload,
};
pub use orchestration::{
    AdaptiveThrottle, BatchOutcome, Collaborators, Deliverer, Generator, InsightSource,
    PipelineOrchestrator, SelectionLedger, ShutdownHandle, StageExecutor,
};
pub use resilience::{
    ErrorClassifier, FixedWindowRateLimiter, RetryDecision, RetryExecutor, RetryPolicy,
    SeededJitter, StandardErrorClassifier,
};
pub use services::CandidateRanker;
