//! # TTL Cache
//!
//! Capacity-bounded key/value store with per-entry time-to-live and least-recently-used
//! eviction. Expired entries are removed lazily when read, or in bulk through
//! [`TtlCache::purge_expired`].
//!
//! All state sits behind a single `parking_lot::Mutex`. No lock is held across an
//! `.await`, so workers never block one another on an external call.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// One stored value and its bookkeeping
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: Instant,
    pub ttl: Duration,
    pub last_accessed_at: Instant,
    pub access_count: u64,
    /// Monotonic touch sequence; orders entries touched within the same instant
    touch_seq: u64,
}

impl<V> CacheEntry<V> {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= self.ttl
    }

    /// Time left before expiry
    pub fn remaining_ttl(&self, now: Instant) -> Duration {
        self.ttl
            .saturating_sub(now.saturating_duration_since(self.created_at))
    }
}

/// Point-in-time cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries removed to respect capacity
    pub evictions: u64,
    /// Entries removed because their ttl elapsed
    pub expirations: u64,
    pub size: usize,
    pub capacity: usize,
}

#[derive(Debug)]
struct CacheState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    next_seq: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl<K: Eq + Hash, V> CacheState<K, V> {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

/// Thread-safe TTL + LRU cache
#[derive(Debug)]
pub struct TtlCache<K, V> {
    capacity: usize,
    state: Mutex<CacheState<K, V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                next_seq: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
                expirations: 0,
            }),
        }
    }

    /// Look up `key`. An expired entry counts as a miss and is removed.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut state = self.state.lock();

        let expired = match state.entries.get(key) {
            None => {
                state.misses += 1;
                return None;
            }
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            state.entries.remove(key);
            state.expirations += 1;
            state.misses += 1;
            return None;
        }

        let seq = state.next_seq();
        state.hits += 1;
        let entry = state.entries.get_mut(key)?;
        entry.last_accessed_at = now;
        entry.access_count += 1;
        entry.touch_seq = seq;
        Some(entry.value.clone())
    }

    /// Store or overwrite `key`. When the cache grows past capacity the least recently
    /// accessed entry is evicted.
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        let now = Instant::now();
        let mut state = self.state.lock();
        let seq = state.next_seq();

        state.entries.insert(
            key,
            CacheEntry {
                value,
                created_at: now,
                ttl,
                last_accessed_at: now,
                access_count: 0,
                touch_seq: seq,
            },
        );

        while state.entries.len() > self.capacity {
            let victim = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| (entry.last_accessed_at, entry.touch_seq))
                .map(|(k, _)| k.clone());

            match victim {
                Some(victim) => {
                    state.entries.remove(&victim);
                    state.evictions += 1;
                    debug!(capacity = self.capacity, "🗑️ CACHE: Evicted least recently used entry");
                }
                None => break,
            }
        }
    }

    /// Remove `key` if present, returning whether anything was removed
    pub fn remove(&self, key: &K) -> bool {
        self.state.lock().entries.remove(key).is_some()
    }

    /// Whether a live entry exists. Does not count as an access.
    pub fn contains_key(&self, key: &K) -> bool {
        let now = Instant::now();
        self.state
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Snapshot of an entry's bookkeeping without touching it
    pub fn peek_entry(&self, key: &K) -> Option<CacheEntry<V>> {
        self.state.lock().entries.get(key).cloned()
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut state = self.state.lock();
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before - state.entries.len();
        state.expirations += purged as u64;
        if purged > 0 {
            debug!(purged = purged, "🗑️ CACHE: Purged expired entries");
        }
        purged
    }

    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }

    /// Entries currently stored, including expired ones not yet observed
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            expirations: state.expirations,
            size: state.entries.len(),
            capacity: self.capacity,
        }
    }
}
