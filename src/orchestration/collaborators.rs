//! # External Collaborators
//!
//! Capability traits for the services the pipeline calls out to. Implementations own
//! their transport; the pipeline only sees values and [`ExternalError`]s.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::error::ExternalError;
use crate::models::{Content, Deliverable, DeliveryTarget, Insight, InsightWindow, Prompt, Receipt};

/// Supplies context for a tenant over a time window
#[async_trait]
pub trait InsightSource: Send + Sync {
    async fn fetch(&self, tenant_id: &str, window: InsightWindow) -> Result<Insight, ExternalError>;
}

/// Expensive, rate-limited and occasionally unreliable content generation
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &Prompt) -> Result<Content, ExternalError>;
}

/// Publishes generated content to its destination
#[async_trait]
pub trait Deliverer: Send + Sync {
    async fn publish(
        &self,
        deliverable: &Deliverable,
        target: &DeliveryTarget,
    ) -> Result<Receipt, ExternalError>;
}

/// The three collaborators a pipeline needs
#[derive(Clone)]
pub struct Collaborators {
    pub insight: Arc<dyn InsightSource>,
    pub generator: Arc<dyn Generator>,
    pub deliverer: Arc<dyn Deliverer>,
}

impl Collaborators {
    pub fn new(
        insight: Arc<dyn InsightSource>,
        generator: Arc<dyn Generator>,
        deliverer: Arc<dyn Deliverer>,
    ) -> Self {
        Self {
            insight,
            generator,
            deliverer,
        }
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
