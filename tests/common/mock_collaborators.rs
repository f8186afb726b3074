//! Scripted collaborators with call counters.
//!
//! Failures are keyed by tenant (insight), subject (generation) or destination
//! (delivery) so a single batch can mix outcomes deterministically.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pipeline_core::error::ExternalError;
use pipeline_core::models::{
    Candidate, Content, Deliverable, DeliveryTarget, Insight, InsightWindow, Prompt, Receipt,
};
use pipeline_core::orchestration::{Collaborators, Deliverer, Generator, InsightSource};

/// Tracks how many calls are inside a collaborator at once
#[derive(Debug, Default)]
pub struct InFlightTracker {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlightTracker {
    fn enter(self: &Arc<Self>) -> InFlightGuard {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlightGuard {
            tracker: Arc::clone(self),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct InFlightGuard {
    tracker: Arc<InFlightTracker>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.tracker.current.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
pub struct MockInsightSource {
    calls: AtomicUsize,
    failing_tenants: HashSet<String>,
}

impl MockInsightSource {
    pub fn failing_for(tenants: &[&str]) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failing_tenants: tenants.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InsightSource for MockInsightSource {
    async fn fetch(&self, tenant_id: &str, _window: InsightWindow) -> Result<Insight, ExternalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_tenants.contains(tenant_id) {
            return Err(ExternalError::Unavailable(format!("no insight for {tenant_id}")));
        }
        let mut insight = Insight {
            summary: format!("recent activity for {tenant_id}"),
            ..Insight::default()
        };
        insight.signals.insert("engagement".to_string(), 0.6);
        Ok(insight)
    }
}

#[derive(Debug, Default)]
pub struct MockGenerator {
    calls: AtomicUsize,
    delay: Duration,
    failures: HashMap<String, ExternalError>,
    panics: HashSet<String>,
    /// Subject -> number of leading calls that fail transiently
    flaky: Mutex<HashMap<String, u32>>,
    tracker: Arc<InFlightTracker>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_on(mut self, subject: &str, error: ExternalError) -> Self {
        self.failures.insert(subject.to_string(), error);
        self
    }

    pub fn panicking_on(mut self, subject: &str) -> Self {
        self.panics.insert(subject.to_string());
        self
    }

    pub fn flaky_on(self, subject: &str, failures: u32) -> Self {
        self.flaky.lock().insert(subject.to_string(), failures);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.tracker.peak()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<Content, ExternalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _guard = self.tracker.enter();

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.panics.contains(&prompt.subject) {
            panic!("generator exploded on '{}'", prompt.subject);
        }
        if let Some(error) = self.failures.get(&prompt.subject) {
            return Err(error.clone());
        }
        {
            let mut flaky = self.flaky.lock();
            if let Some(remaining) = flaky.get_mut(&prompt.subject) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(ExternalError::Transient("try again".to_string()));
                }
            }
        }

        Ok(Content::text(format!("Copy about {} for {}", prompt.subject, prompt.tenant_id))
            .with_candidates(vec![
                Candidate::new("slow-burn", 0.2, 0.1),
                Candidate::new("crowd-pleaser", 0.9, 0.4),
                Candidate::new("rising", 0.5, 0.9),
            ]))
    }
}

#[derive(Debug, Default)]
pub struct MockDeliverer {
    calls: AtomicUsize,
    failing_destinations: HashSet<String>,
}

impl MockDeliverer {
    pub fn failing_for(destinations: &[&str]) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failing_destinations: destinations.iter().map(|d| (*d).to_string()).collect(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Deliverer for MockDeliverer {
    async fn publish(
        &self,
        deliverable: &Deliverable,
        target: &DeliveryTarget,
    ) -> Result<Receipt, ExternalError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_destinations.contains(&target.destination) {
            return Err(ExternalError::Unavailable(format!(
                "mailbox {} rejected delivery",
                target.destination
            )));
        }
        Ok(Receipt {
            delivery_id: format!("dlv-{}-{call}", deliverable.item_id),
            delivered_at: chrono::Utc::now(),
        })
    }
}

/// The three mocks plus the handles the tests inspect
pub struct MockPipeline {
    pub insight: Arc<MockInsightSource>,
    pub generator: Arc<MockGenerator>,
    pub deliverer: Arc<MockDeliverer>,
}

impl MockPipeline {
    pub fn new(insight: MockInsightSource, generator: MockGenerator, deliverer: MockDeliverer) -> Self {
        Self {
            insight: Arc::new(insight),
            generator: Arc::new(generator),
            deliverer: Arc::new(deliverer),
        }
    }

    pub fn healthy() -> Self {
        Self::new(MockInsightSource::default(), MockGenerator::new(), MockDeliverer::default())
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(
            Arc::clone(&self.insight) as Arc<dyn InsightSource>,
            Arc::clone(&self.generator) as Arc<dyn Generator>,
            Arc::clone(&self.deliverer) as Arc<dyn Deliverer>,
        )
    }
}
