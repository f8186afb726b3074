//! # External Error Classification
//!
//! Decides whether a failed external call is worth another attempt. Classification is
//! a pure function of the error value; messages are never inspected.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ExternalError;

/// Outcome of classifying one error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RetryDecision {
    /// Another attempt may succeed
    Retryable,
    /// Stop immediately and propagate
    Fatal,
}

impl RetryDecision {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable)
    }
}

impl fmt::Display for RetryDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retryable => write!(f, "retryable"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

/// Strategy trait for error classification
pub trait ErrorClassifier<E>: Send + Sync {
    fn classify(&self, error: &E) -> RetryDecision;
}

/// Default classifier for collaborator errors.
///
/// Remote throttling, unavailability, transient failures and timeouts are retried;
/// fatal rejections and invalid responses are not.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardErrorClassifier;

impl StandardErrorClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl ErrorClassifier<ExternalError> for StandardErrorClassifier {
    fn classify(&self, error: &ExternalError) -> RetryDecision {
        match error {
            ExternalError::RateLimited(_)
            | ExternalError::Unavailable(_)
            | ExternalError::Transient(_)
            | ExternalError::Timeout(_) => RetryDecision::Retryable,
            ExternalError::Fatal(_) | ExternalError::InvalidResponse(_) => RetryDecision::Fatal,
        }
    }
}

impl<E, F> ErrorClassifier<E> for F
where
    F: Fn(&E) -> RetryDecision + Send + Sync,
{
    fn classify(&self, error: &E) -> RetryDecision {
        self(error)
    }
}
