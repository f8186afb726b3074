//! # Pipeline Error Taxonomy
//!
//! Errors that can end a stage or an item. A stage failure is captured into the
//! owning item's [`PipelineResult`](crate::models::PipelineResult) and never crosses
//! item boundaries, so these values are `Clone` and serializable.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigurationError;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "details", rename_all = "snake_case")]
pub enum PipelineError {
    /// Malformed work item, rejected before enqueue. Never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Local rate limiter denied the call. Not retried internally.
    #[error("Rate limited for identity '{identity}'")]
    RateLimited { identity: String },

    /// Retryable external failure that exhausted the retry budget.
    #[error("Transient external error after {attempts} attempt(s): {message}")]
    TransientExternal { message: String, attempts: u32 },

    /// Non-retryable external failure.
    #[error("Fatal external error after {attempts} attempt(s): {message}")]
    FatalExternal { message: String, attempts: u32 },

    /// External call kept timing out until the retry budget was spent.
    #[error("Timeout during {operation} after {attempts} attempt(s)")]
    Timeout { operation: String, attempts: u32 },

    /// Item was never started because a stop was requested.
    #[error("Cancelled before processing started")]
    Cancelled,

    /// Processing of the item panicked; the worker survived.
    #[error("Worker panicked while processing item: {message}")]
    WorkerPanicked { message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl PipelineError {
    /// Stable, snake_case error code for logs and summaries
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::RateLimited { .. } => "rate_limited",
            Self::TransientExternal { .. } => "transient_external",
            Self::FatalExternal { .. } => "fatal_external",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled => "cancelled",
            Self::WorkerPanicked { .. } => "worker_panicked",
            Self::Configuration(_) => "configuration",
        }
    }

    /// Number of external attempts that were made before this error was produced
    pub fn attempts(&self) -> u32 {
        match self {
            Self::TransientExternal { attempts, .. }
            | Self::FatalExternal { attempts, .. }
            | Self::Timeout { attempts, .. } => *attempts,
            _ => 0,
        }
    }
}

impl From<ConfigurationError> for PipelineError {
    fn from(error: ConfigurationError) -> Self {
        PipelineError::Configuration(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failure reported by an external collaborator (insight source, generator, deliverer).
///
/// Whether a variant is retried is decided by an
/// [`ErrorClassifier`](crate::resilience::ErrorClassifier), never by inspecting messages.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum ExternalError {
    /// Remote side is throttling us (e.g. HTTP 429)
    #[error("rate limited by remote service: {0}")]
    RateLimited(String),

    /// Remote side is temporarily unavailable (e.g. HTTP 502/503)
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Any other failure expected to clear on its own
    #[error("transient failure: {0}")]
    Transient(String),

    /// Attempt exceeded its time bound
    #[error("timed out: {0}")]
    Timeout(String),

    /// Request was rejected and will not succeed on retry
    #[error("fatal failure: {0}")]
    Fatal(String),

    /// Remote answered with something unusable
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ExternalError {
    /// Convert into the pipeline taxonomy once retries are exhausted or refused
    pub fn into_pipeline_error(self, operation: &str, attempts: u32) -> PipelineError {
        match self {
            Self::Timeout(_) => PipelineError::Timeout {
                operation: operation.to_string(),
                attempts,
            },
            Self::RateLimited(_) | Self::Unavailable(_) | Self::Transient(_) => {
                PipelineError::TransientExternal {
                    message: self.to_string(),
                    attempts,
                }
            }
            Self::Fatal(_) | Self::InvalidResponse(_) => PipelineError::FatalExternal {
                message: self.to_string(),
                attempts,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(PipelineError::Validation("x".into()).code(), "validation");
        assert_eq!(
            PipelineError::RateLimited {
                identity: "t".into()
            }
            .code(),
            "rate_limited"
        );
        assert_eq!(PipelineError::Cancelled.code(), "cancelled");
    }

    #[test]
    fn test_attempts_reported_for_external_errors() {
        let err = PipelineError::TransientExternal {
            message: "503".into(),
            attempts: 3,
        };
        assert_eq!(err.attempts(), 3);
        assert_eq!(PipelineError::Validation("x".into()).attempts(), 0);
    }

    #[test]
    fn test_external_error_mapping() {
        assert_eq!(
            ExternalError::Timeout("slow".into()).into_pipeline_error("generate", 3),
            PipelineError::Timeout {
                operation: "generate".into(),
                attempts: 3
            }
        );
        assert_eq!(
            ExternalError::Unavailable("503".into())
                .into_pipeline_error("generate", 2)
                .code(),
            "transient_external"
        );
        assert_eq!(
            ExternalError::InvalidResponse("empty".into())
                .into_pipeline_error("generate", 1)
                .code(),
            "fatal_external"
        );
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let err = PipelineError::RateLimited {
            identity: "tenant-a".into(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "rate_limited");
        assert_eq!(json["details"]["identity"], "tenant-a");
    }
}
