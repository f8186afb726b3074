//! # Resilience Module
//!
//! Protection around the expensive external generation call:
//!
//! - **Rate limiting**: [`FixedWindowRateLimiter`] caps calls per tenant and window
//! - **Retries**: [`RetryExecutor`] retries classified-retryable failures with
//!   exponential backoff and injectable jitter
//! - **Classification**: [`ErrorClassifier`] maps an error to [`RetryDecision`]
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pipeline_core::error::ExternalError;
//! use pipeline_core::resilience::{RetryExecutor, RetryPolicy, SeededJitter, StandardErrorClassifier};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let executor = RetryExecutor::new(RetryPolicy::default(), Arc::new(SeededJitter::from_seed(7)));
//! let outcome = executor
//!     .execute(
//!         |_attempt| async { Ok::<_, ExternalError>("generated") },
//!         &StandardErrorClassifier,
//!     )
//!     .await;
//! assert!(outcome.is_ok());
//! # }
//! ```

pub mod error_classifier;
pub mod rate_limiter;
pub mod retry;

pub use error_classifier::{ErrorClassifier, RetryDecision, StandardErrorClassifier};
pub use rate_limiter::{FixedWindowRateLimiter, RateWindow};
pub use retry::{
    JitterSource, NoJitter, RetryError, RetryExecutor, RetryPolicy, RetrySuccess, SeededJitter,
};
