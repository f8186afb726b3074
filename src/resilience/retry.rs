//! # Retry Executor
//!
//! Bounded retries with exponential backoff and jitter.
//!
//! The delay slept before attempt `i + 1` (after `i` failed attempts) is
//! `min(base * 2^(i-1), max_delay) + uniform(0, jitter_ms)`. A non-retryable error, or
//! the last permitted attempt failing, is returned immediately without sleeping.
//!
//! Jitter comes from an injectable [`JitterSource`] so retry timing is reproducible in
//! tests. The operation may be invoked more than once; keeping it idempotent is the
//! caller's job.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::resilience::error_classifier::{ErrorClassifier, RetryDecision};

/// Source of the random component added to each backoff delay
pub trait JitterSource: Send + Sync + fmt::Debug {
    /// Uniform value in `[0, max_ms]`
    fn jitter_ms(&self, max_ms: u64) -> u64;
}

/// Deterministic when built with [`SeededJitter::from_seed`]
#[derive(Debug)]
pub struct SeededJitter {
    rng: Mutex<StdRng>,
}

impl SeededJitter {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl JitterSource for SeededJitter {
    fn jitter_ms(&self, max_ms: u64) -> u64 {
        if max_ms == 0 {
            return 0;
        }
        self.rng.lock().gen_range(0..=max_ms)
    }
}

/// Always zero
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl JitterSource for NoJitter {
    fn jitter_ms(&self, _max_ms: u64) -> u64 {
        0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            jitter_ms: config.jitter_ms,
        }
    }

    /// Same backoff shape with a different attempt budget
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Exponential part of the delay after `failed_attempts` failures (1-based)
    pub fn backoff_for(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(31);
        let factor = 1_u32 << exponent;
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Successful execution and the attempt that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct RetrySuccess<T> {
    pub value: T,
    pub attempts: u32,
}

/// Final error with the number of attempts spent on it
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{error} (after {attempts} attempt(s), {decision})")]
pub struct RetryError<E: fmt::Display + fmt::Debug> {
    pub error: E,
    pub attempts: u32,
    /// Classification of the final error; `Retryable` means the budget ran out
    pub decision: RetryDecision,
}

impl<E: fmt::Display + fmt::Debug> RetryError<E> {
    pub fn exhausted(&self) -> bool {
        self.decision.is_retryable()
    }
}

#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    jitter: Arc<dyn JitterSource>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy, jitter: Arc<dyn JitterSource>) -> Self {
        Self { policy, jitter }
    }

    /// Build from configuration; a configured seed makes jitter reproducible
    pub fn from_config(config: &RetryConfig) -> Self {
        let jitter: Arc<dyn JitterSource> = match config.seed {
            Some(seed) => Arc::new(SeededJitter::from_seed(seed)),
            None => Arc::new(SeededJitter::from_entropy()),
        };
        Self::new(RetryPolicy::from_config(config), jitter)
    }

    /// Same jitter source, different policy
    pub fn with_policy(&self, policy: RetryPolicy) -> Self {
        Self {
            policy,
            jitter: Arc::clone(&self.jitter),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Full delay (backoff plus jitter) to sleep after `failed_attempts` failures
    pub fn delay_for(&self, failed_attempts: u32) -> Duration {
        self.policy.backoff_for(failed_attempts)
            + Duration::from_millis(self.jitter.jitter_ms(self.policy.jitter_ms))
    }

    /// Run `operation` until it succeeds, fails fatally, or the attempt budget is spent.
    ///
    /// `operation` receives the 1-based attempt number.
    pub async fn execute<T, E, F, Fut, C>(
        &self,
        mut operation: F,
        classifier: &C,
    ) -> Result<RetrySuccess<T>, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display + fmt::Debug,
        C: ErrorClassifier<E> + ?Sized,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt = attempt, "🔁 RETRY: Operation succeeded after retry");
                    }
                    return Ok(RetrySuccess {
                        value,
                        attempts: attempt,
                    });
                }
                Err(error) => {
                    let decision = classifier.classify(&error);

                    if decision == RetryDecision::Fatal || attempt >= max_attempts {
                        debug!(
                            attempt = attempt,
                            max_attempts = max_attempts,
                            decision = %decision,
                            error = %error,
                            "🔁 RETRY: Giving up"
                        );
                        return Err(RetryError {
                            error,
                            attempts: attempt,
                            decision,
                        });
                    }

                    let delay = self.delay_for(attempt);
                    warn!(
                        attempt = attempt,
                        max_attempts = max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "🔁 RETRY: Retryable failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), Arc::new(SeededJitter::from_entropy()))
    }
}
