//! # Fixed-Window Rate Limiter
//!
//! Per-identity request counter over fixed windows of length `W`.
//!
//! On each call: if `now - window_start >= W` the window restarts at `now` with a zero
//! count; the count is then incremented and the call is allowed while
//! `count <= max_per_window`.
//!
//! Because windows are fixed, a client can be granted up to `2 * max_per_window` calls
//! in a short span straddling a window boundary. This approximation is accepted.
//! Denied calls still count towards the current window.

use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::RateLimitConfig;

/// Window state for one identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub window_start: Instant,
    pub count: u32,
}

#[derive(Debug)]
pub struct FixedWindowRateLimiter {
    window: Duration,
    max_per_window: u32,
    windows: DashMap<String, RateWindow>,
}

impl FixedWindowRateLimiter {
    pub fn new(window: Duration, max_per_window: u32) -> Self {
        Self {
            window,
            max_per_window,
            windows: DashMap::new(),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.window(), config.max_per_window)
    }

    /// Count a call for `identity` and report whether it is allowed
    pub fn try_acquire(&self, identity: &str) -> bool {
        self.try_acquire_at(identity, Instant::now())
    }

    /// [`try_acquire`](Self::try_acquire) against an explicit clock reading
    pub fn try_acquire_at(&self, identity: &str, now: Instant) -> bool {
        let mut entry = self
            .windows
            .entry(identity.to_string())
            .or_insert(RateWindow {
                window_start: now,
                count: 0,
            });

        if now.saturating_duration_since(entry.window_start) >= self.window {
            entry.window_start = now;
            entry.count = 0;
        }

        entry.count = entry.count.saturating_add(1);
        let allowed = entry.count <= self.max_per_window;

        if allowed {
            debug!(
                identity = identity,
                count = entry.count,
                limit = self.max_per_window,
                "🚦 RATE_LIMIT: Acquired"
            );
        } else {
            warn!(
                identity = identity,
                count = entry.count,
                limit = self.max_per_window,
                window_ms = self.window.as_millis() as u64,
                "🚦 RATE_LIMIT: Denied"
            );
        }
        allowed
    }

    /// Calls still allowed for `identity` in its current window
    pub fn remaining(&self, identity: &str) -> u32 {
        let now = Instant::now();
        match self.windows.get(identity) {
            None => self.max_per_window,
            Some(window) if now.saturating_duration_since(window.window_start) >= self.window => {
                self.max_per_window
            }
            Some(window) => self.max_per_window.saturating_sub(window.count),
        }
    }

    /// Forget the window for `identity`
    pub fn reset(&self, identity: &str) {
        self.windows.remove(identity);
    }

    /// Drop windows that have already elapsed at `now`; returns how many were removed.
    /// An elapsed window restarts on its next call, so no decision changes.
    pub fn purge_stale(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, window| now.saturating_duration_since(window.window_start) < self.window);
        let purged = before.saturating_sub(self.windows.len());
        if purged > 0 {
            debug!(purged = purged, tracked = self.windows.len(), "🚦 RATE_LIMIT: Purged stale windows");
        }
        purged
    }

    pub fn window_for(&self, identity: &str) -> Option<RateWindow> {
        self.windows.get(identity).map(|w| *w)
    }

    /// Number of identities with a tracked window
    pub fn tracked_identities(&self) -> usize {
        self.windows.len()
    }

    pub fn limit(&self) -> u32 {
        self.max_per_window
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
