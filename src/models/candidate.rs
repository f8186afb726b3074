//! Candidate and ranking criteria types consumed by
//! [`CandidateRanker`](crate::services::CandidateRanker).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Measured features of a candidate
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CandidateFeatures {
    /// Normalised popularity signal
    pub popularity: f64,
    /// Normalised growth/velocity signal
    pub velocity: f64,
    /// Additional numeric features addressable by a [`NumericTarget`]
    #[serde(default)]
    pub numeric: BTreeMap<String, f64>,
    /// Categorical features addressable by a [`CategoryMatch`]
    #[serde(default)]
    pub categorical: BTreeMap<String, String>,
}

/// Ranking input. Never mutated by ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub features: CandidateFeatures,
    /// Additive prior; zero leaves the weighted-sum score untouched
    #[serde(default)]
    pub base_score: f64,
}

impl Candidate {
    pub fn new(id: impl Into<String>, popularity: f64, velocity: f64) -> Self {
        Self {
            id: id.into(),
            features: CandidateFeatures {
                popularity,
                velocity,
                ..Default::default()
            },
            base_score: 0.0,
        }
    }

    pub fn with_numeric(mut self, feature: impl Into<String>, value: f64) -> Self {
        self.features.numeric.insert(feature.into(), value);
        self
    }

    pub fn with_category(mut self, feature: impl Into<String>, value: impl Into<String>) -> Self {
        self.features.categorical.insert(feature.into(), value.into());
        self
    }

    pub fn with_base_score(mut self, base_score: f64) -> Self {
        self.base_score = base_score;
        self
    }
}

/// Reward closeness of a numeric feature to a target value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericTarget {
    pub feature: String,
    pub target: f64,
}

/// Flat bonus when a categorical feature equals `value` exactly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMatch {
    pub feature: String,
    pub value: String,
}

/// Optional ranking criteria; absent parts contribute no bonus
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RankingCriteria {
    #[serde(default)]
    pub numeric_target: Option<NumericTarget>,
    #[serde(default)]
    pub category: Option<CategoryMatch>,
    /// Truncate the ranking to at most this many candidates
    #[serde(default)]
    pub max_results: Option<usize>,
    /// Drop candidates scoring below this floor
    #[serde(default)]
    pub min_score: Option<f64>,
}

impl RankingCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_numeric_target(mut self, feature: impl Into<String>, target: f64) -> Self {
        self.numeric_target = Some(NumericTarget {
            feature: feature.into(),
            target,
        });
        self
    }

    pub fn with_category(mut self, feature: impl Into<String>, value: impl Into<String>) -> Self {
        self.category = Some(CategoryMatch {
            feature: feature.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = Some(min_score);
        self
    }

    /// Reject non-finite targets and floors
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(target) = &self.numeric_target {
            if !target.target.is_finite() {
                return Err(format!(
                    "numeric target for '{}' must be finite",
                    target.feature
                ));
            }
        }
        if let Some(min) = self.min_score {
            if !min.is_finite() {
                return Err("min_score must be finite".to_string());
            }
        }
        Ok(())
    }
}

/// One entry of a ranking result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    /// 1-based position in the ordering
    pub rank: usize,
    pub score: f64,
    pub candidate: Candidate,
}
