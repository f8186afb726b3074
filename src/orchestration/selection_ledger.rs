//! # Selection Ledger
//!
//! Batch-scoped record of the candidate ids already handed to an item. Every
//! `run_batch` call starts a fresh ledger; a disabled ledger accepts every candidate.

use dashmap::DashSet;

#[derive(Debug, Default)]
pub struct SelectionLedger {
    claimed: Option<DashSet<String>>,
}

impl SelectionLedger {
    pub fn new(enabled: bool) -> Self {
        Self {
            claimed: enabled.then(DashSet::new),
        }
    }

    /// Ledger that never withholds a candidate
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.claimed.is_some()
    }

    /// Claim `candidate_id` for the calling item. Returns false if an earlier item of
    /// the batch already holds it.
    pub fn claim(&self, candidate_id: &str) -> bool {
        match &self.claimed {
            Some(claimed) => claimed.insert(candidate_id.to_string()),
            None => true,
        }
    }

    /// Number of distinct candidate ids claimed so far
    pub fn len(&self) -> usize {
        self.claimed.as_ref().map_or(0, DashSet::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_enabled_ledger_claims_each_id_once() {
        let ledger = SelectionLedger::new(true);
        assert!(ledger.is_enabled());
        assert!(ledger.claim("a"));
        assert!(!ledger.claim("a"));
        assert!(ledger.claim("b"));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_disabled_ledger_accepts_everything() {
        let ledger = SelectionLedger::disabled();
        assert!(!ledger.is_enabled());
        assert!(ledger.claim("a"));
        assert!(ledger.claim("a"));
        assert!(ledger.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_have_one_winner() {
        let ledger = Arc::new(SelectionLedger::new(true));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move { ledger.claim("contested") }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
