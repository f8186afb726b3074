//! # Work Items
//!
//! A [`WorkItemRequest`] is what callers submit. It is validated before enqueue and
//! promoted to an immutable [`WorkItem`] that workers share through an `Arc`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::constants::limits;
use crate::error::{PipelineError, Result};
use crate::models::candidate::RankingCriteria;

/// Content-bearing part of a work item
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkPayload {
    /// What the generation is about
    pub subject: String,

    /// Descriptive attributes that shape generation (part of the cache key)
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    /// Explicit tenant preferences (part of the cache key)
    #[serde(default)]
    pub preferences: BTreeMap<String, String>,

    /// Where the delivered output should go (not part of the cache key)
    #[serde(default)]
    pub destination: String,

    /// Optional criteria used to rank the candidates contained in generated content
    #[serde(default)]
    pub criteria: Option<RankingCriteria>,
}

impl WorkPayload {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_preference(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.preferences.insert(key.into(), value.into());
        self
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    pub fn with_criteria(mut self, criteria: RankingCriteria) -> Self {
        self.criteria = Some(criteria);
        self
    }
}

/// Caller-facing submission; `id` is generated when absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItemRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub tenant_id: String,
    pub payload: WorkPayload,
}

impl WorkItemRequest {
    pub fn new(tenant_id: impl Into<String>, payload: WorkPayload) -> Self {
        Self {
            id: None,
            tenant_id: tenant_id.into(),
            payload,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Assign a generated UUID when the caller supplied no id, so even a rejected
    /// request is reported under a unique identifier
    pub fn ensure_id(mut self) -> Self {
        if self.id.is_none() {
            self.id = Some(Uuid::new_v4().to_string());
        }
        self
    }

    /// Identifier used for reporting even when the request is rejected
    pub fn display_id(&self) -> String {
        self.id.clone().unwrap_or_default()
    }

    /// Validate and promote to an immutable [`WorkItem`]
    pub fn into_work_item(self) -> Result<WorkItem> {
        let id = match self.id {
            Some(id) => {
                validate_item_id(&id)?;
                id
            }
            None => Uuid::new_v4().to_string(),
        };

        let tenant_id = self.tenant_id.trim().to_string();
        if tenant_id.is_empty() {
            return Err(PipelineError::Validation(format!(
                "item '{id}': tenant_id must not be empty"
            )));
        }
        if tenant_id.len() > limits::MAX_TENANT_ID_LENGTH {
            return Err(PipelineError::Validation(format!(
                "item '{id}': tenant_id exceeds {} characters",
                limits::MAX_TENANT_ID_LENGTH
            )));
        }

        validate_payload(&id, &self.payload)?;

        Ok(WorkItem {
            id,
            tenant_id,
            payload: self.payload,
            submitted_at: Utc::now(),
        })
    }
}

fn validate_item_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(PipelineError::Validation("item id must not be empty".to_string()));
    }
    if id.len() > limits::MAX_ITEM_ID_LENGTH {
        return Err(PipelineError::Validation(format!(
            "item id exceeds {} characters",
            limits::MAX_ITEM_ID_LENGTH
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
    {
        return Err(PipelineError::Validation(format!(
            "item id '{id}' contains characters outside [A-Za-z0-9-_.:]"
        )));
    }
    Ok(())
}

fn validate_payload(id: &str, payload: &WorkPayload) -> Result<()> {
    let subject = payload.subject.trim();
    if subject.is_empty() {
        return Err(PipelineError::Validation(format!(
            "item '{id}': payload.subject must not be empty"
        )));
    }
    if subject.len() > limits::MAX_SUBJECT_LENGTH {
        return Err(PipelineError::Validation(format!(
            "item '{id}': payload.subject exceeds {} characters",
            limits::MAX_SUBJECT_LENGTH
        )));
    }
    if let Some(key) = payload
        .attributes
        .keys()
        .chain(payload.preferences.keys())
        .find(|k| k.trim().is_empty())
    {
        return Err(PipelineError::Validation(format!(
            "item '{id}': blank attribute/preference key {key:?}"
        )));
    }
    if let Some(criteria) = &payload.criteria {
        criteria
            .validate()
            .map_err(|reason| PipelineError::Validation(format!("item '{id}': {reason}")))?;
    }
    Ok(())
}

/// Immutable unit of batch work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    pub tenant_id: String,
    pub payload: WorkPayload,
    pub submitted_at: DateTime<Utc>,
}

impl WorkItem {
    /// Build and validate an item with an explicit id
    pub fn new(
        id: impl Into<String>,
        tenant_id: impl Into<String>,
        payload: WorkPayload,
    ) -> Result<Self> {
        WorkItemRequest::new(tenant_id, payload)
            .with_id(id)
            .into_work_item()
    }
}
