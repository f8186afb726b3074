//! Values exchanged with the external collaborators (insight source, generator,
//! deliverer).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::models::candidate::{Candidate, RankedCandidate};
use crate::models::work_item::WorkItem;

/// Time range an insight fetch covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl InsightWindow {
    /// Window ending at `end` and reaching `lookback_hours` into the past.
    ///
    /// A lookback reaching before the representable range starts at `DateTime::MIN_UTC`.
    pub fn ending_at(end: DateTime<Utc>, lookback_hours: u32) -> Self {
        let start = Duration::try_hours(i64::from(lookback_hours))
            .and_then(|lookback| end.checked_sub_signed(lookback))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { start, end }
    }
}

/// Output of the Insight stage
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Insight {
    pub summary: String,
    #[serde(default)]
    pub signals: BTreeMap<String, f64>,
}

/// Input to the generator, built from the item and its insight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub tenant_id: String,
    pub subject: String,
    pub attributes: BTreeMap<String, String>,
    pub preferences: BTreeMap<String, String>,
    pub insight: Insight,
}

impl Prompt {
    pub fn for_item(item: &WorkItem, insight: &Insight) -> Self {
        Self {
            tenant_id: item.tenant_id.clone(),
            subject: item.payload.subject.trim().to_string(),
            attributes: item.payload.attributes.clone(),
            preferences: item.payload.preferences.clone(),
            insight: insight.clone(),
        }
    }

    /// Plain-text rendering for text-in/text-out generators
    pub fn render(&self) -> String {
        let mut out = format!("Subject: {}\n", self.subject);
        for (key, value) in &self.attributes {
            let _ = writeln!(out, "Attribute {key}: {value}");
        }
        for (key, value) in &self.preferences {
            let _ = writeln!(out, "Preference {key}: {value}");
        }
        if !self.insight.summary.is_empty() {
            let _ = writeln!(out, "Insight: {}", self.insight.summary);
        }
        for (signal, value) in &self.insight.signals {
            let _ = writeln!(out, "Signal {signal}: {value}");
        }
        out
    }
}

/// Output of the Generate stage; this is what the cache stores
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Content {
    pub body: String,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub model: Option<String>,
}

impl Content {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_candidates(mut self, candidates: Vec<Candidate>) -> Self {
        self.candidates = candidates;
        self
    }
}

/// What the Deliver stage publishes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deliverable {
    pub item_id: String,
    pub tenant_id: String,
    pub content: Content,
    /// Ranked candidates selected from `content.candidates`
    pub selections: Vec<RankedCandidate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryTarget {
    pub tenant_id: String,
    pub destination: String,
}

/// Acknowledgement from the deliverer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub delivery_id: String,
    pub delivered_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::work_item::WorkPayload;

    #[test]
    fn test_insight_window_lookback() {
        let end = Utc::now();
        let window = InsightWindow::ending_at(end, 24);
        assert_eq!(window.end - window.start, Duration::hours(24));
    }

    #[test]
    fn test_insight_window_saturates_instead_of_overflowing() {
        let end = Utc::now();
        let window = InsightWindow::ending_at(end, u32::MAX);
        assert_eq!(window.start, DateTime::<Utc>::MIN_UTC);
        assert_eq!(window.end, end);
    }

    #[test]
    fn test_prompt_render_is_ordered() {
        let item = WorkItem::new(
            "i1",
            "t1",
            WorkPayload::new("  launch post ")
                .with_attribute("tone", "warm")
                .with_attribute("audience", "runners"),
        )
        .unwrap();
        let insight = Insight {
            summary: "engagement up".into(),
            signals: BTreeMap::from([("ctr".to_string(), 0.12)]),
        };
        let rendered = Prompt::for_item(&item, &insight).render();
        assert!(rendered.starts_with("Subject: launch post\n"));
        let audience = rendered.find("audience").unwrap();
        let tone = rendered.find("tone").unwrap();
        assert!(audience < tone);
        assert!(rendered.contains("Insight: engagement up"));
    }
}
