use parking_lot::Mutex;
use std::collections::HashSet;

use crate::models::PipelineResult;

/// Append-only, completion-ordered collection of results shared by all workers.
///
/// Each push happens under one lock, so a result is never observed half written.
#[derive(Debug, Default)]
pub struct ResultSink {
    results: Mutex<Vec<PipelineResult>>,
}

impl ResultSink {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    pub fn push(&self, result: PipelineResult) {
        self.results.lock().push(result);
    }

    pub fn len(&self) -> usize {
        self.results.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ordinals that already have a result
    pub fn recorded_ordinals(&self) -> HashSet<usize> {
        self.results.lock().iter().map(|r| r.ordinal).collect()
    }

    pub fn snapshot(&self) -> Vec<PipelineResult> {
        self.results.lock().clone()
    }

    /// Take every result, leaving the sink empty
    pub fn drain(&self) -> Vec<PipelineResult> {
        std::mem::take(&mut *self.results.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_concurrent_pushes_are_all_kept() {
        let sink = Arc::new(ResultSink::with_capacity(64));
        let mut handles = Vec::new();
        for worker in 0..8_usize {
            let sink = Arc::clone(&sink);
            handles.push(tokio::spawn(async move {
                for i in 0..8 {
                    let ordinal = worker * 8 + i;
                    sink.push(PipelineResult::pending(format!("item-{ordinal}"), "t", ordinal));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(sink.len(), 64);
        assert_eq!(sink.recorded_ordinals().len(), 64);
        assert_eq!(sink.drain().len(), 64);
        assert!(sink.is_empty());
    }
}
