//! # Candidate Ranker
//!
//! Deterministic weighted-sum scoring of candidates against optional criteria.
//!
//! ```text
//! score = base_score
//!       + 0.7 * popularity
//!       + 0.3 * velocity
//!       + 0.5 * max(0, 1 - |target - value| / |target|)   (numeric target given)
//!       + 0.3                                              (categorical exact match)
//! ```
//!
//! Ordering is by score descending with candidate id ascending as the tie-break, so the
//! same input always yields the same output. Inputs are never mutated. Non-finite
//! feature values contribute nothing.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

use crate::models::{Candidate, RankedCandidate, RankingCriteria};

/// Weights applied by [`CandidateRanker`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingWeights {
    pub popularity: f64,
    pub velocity: f64,
    /// Maximum bonus for hitting a numeric target exactly
    pub numeric_target: f64,
    /// Flat bonus for a categorical match
    pub category_match: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            popularity: 0.7,
            velocity: 0.3,
            numeric_target: 0.5,
            category_match: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateRanker {
    weights: RankingWeights,
}

impl CandidateRanker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: RankingWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &RankingWeights {
        &self.weights
    }

    /// Score, filter by `min_score`, order, and truncate to `max_results`
    pub fn rank(&self, candidates: &[Candidate], criteria: &RankingCriteria) -> Vec<RankedCandidate> {
        self.rank_where(candidates, criteria, |_| true)
    }

    /// Like [`rank`](Self::rank), but only candidates passing `accept` are selected.
    ///
    /// `accept` is consulted in rank order and stops being called once `max_results`
    /// candidates have been accepted, so it may claim what it accepts.
    pub fn rank_where<F>(
        &self,
        candidates: &[Candidate],
        criteria: &RankingCriteria,
        mut accept: F,
    ) -> Vec<RankedCandidate>
    where
        F: FnMut(&Candidate) -> bool,
    {
        let mut scored: Vec<(f64, &Candidate)> = candidates
            .iter()
            .map(|candidate| (self.score(candidate, criteria), candidate))
            .filter(|(score, _)| criteria.min_score.map_or(true, |min| *score >= min))
            .collect();

        scored.sort_by(|(score_a, a), (score_b, b)| compare_desc(*score_a, *score_b).then_with(|| a.id.cmp(&b.id)));

        // Repeated ids keep their best-scoring entry
        let mut seen = HashSet::with_capacity(scored.len());
        let limit = criteria.max_results.unwrap_or(usize::MAX);
        let selected: Vec<(f64, &Candidate)> = scored
            .into_iter()
            .filter(|&(_, candidate)| seen.insert(candidate.id.as_str()))
            .filter(|&(_, candidate)| accept(candidate))
            .take(limit)
            .collect();

        debug!(
            candidates = candidates.len(),
            selected = selected.len(),
            "🏅 RANKING: Ranked candidates"
        );

        selected
            .into_iter()
            .enumerate()
            .map(|(index, (score, candidate))| RankedCandidate {
                rank: index + 1,
                score,
                candidate: candidate.clone(),
            })
            .collect()
    }

    /// Score a single candidate
    pub fn score(&self, candidate: &Candidate, criteria: &RankingCriteria) -> f64 {
        let features = &candidate.features;
        let mut score = finite_or_zero(candidate.base_score)
            + self.weights.popularity * finite_or_zero(features.popularity)
            + self.weights.velocity * finite_or_zero(features.velocity);

        if let Some(target) = &criteria.numeric_target {
            if let Some(value) = features.numeric.get(&target.feature) {
                score += self.weights.numeric_target * closeness(target.target, *value);
            }
        }

        if let Some(category) = &criteria.category {
            if features.categorical.get(&category.feature) == Some(&category.value) {
                score += self.weights.category_match;
            }
        }

        score
    }
}

/// `max(0, 1 - |target - value| / |target|)`; a zero target only rewards an exact hit
fn closeness(target: f64, value: f64) -> f64 {
    if !target.is_finite() || !value.is_finite() {
        return 0.0;
    }
    if target == 0.0 {
        return if value == 0.0 { 1.0 } else { 0.0 };
    }
    (1.0 - (target - value).abs() / target.abs()).clamp(0.0, 1.0)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn compare_desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_weighted_sum() {
        let ranker = CandidateRanker::new();
        let candidate = Candidate::new("a", 1.0, 0.5);
        assert!(approx(ranker.score(&candidate, &RankingCriteria::new()), 0.85));
    }

    #[test]
    fn test_numeric_target_bonus() {
        let ranker = CandidateRanker::new();
        let criteria = RankingCriteria::new().with_numeric_target("price", 100.0);

        let exact = Candidate::new("a", 0.0, 0.0).with_numeric("price", 100.0);
        let near = Candidate::new("b", 0.0, 0.0).with_numeric("price", 80.0);
        let far = Candidate::new("c", 0.0, 0.0).with_numeric("price", 300.0);
        let missing = Candidate::new("d", 0.0, 0.0);

        assert!(approx(ranker.score(&exact, &criteria), 0.5));
        assert!(approx(ranker.score(&near, &criteria), 0.4));
        assert!(approx(ranker.score(&far, &criteria), 0.0));
        assert!(approx(ranker.score(&missing, &criteria), 0.0));
    }

    #[test]
    fn test_zero_numeric_target() {
        assert_eq!(closeness(0.0, 0.0), 1.0);
        assert_eq!(closeness(0.0, 1.0), 0.0);
    }

    #[test]
    fn test_category_bonus_requires_exact_match() {
        let ranker = CandidateRanker::new();
        let criteria = RankingCriteria::new().with_category("region", "EU");
        let hit = Candidate::new("a", 0.0, 0.0).with_category("region", "EU");
        let miss = Candidate::new("b", 0.0, 0.0).with_category("region", "eu");
        assert!(approx(ranker.score(&hit, &criteria), 0.3));
        assert!(approx(ranker.score(&miss, &criteria), 0.0));
    }

    #[test]
    fn test_ties_break_by_id() {
        let ranker = CandidateRanker::new();
        let candidates = vec![
            Candidate::new("c", 0.5, 0.5),
            Candidate::new("a", 0.5, 0.5),
            Candidate::new("b", 0.9, 0.0),
        ];
        let ranked = ranker.rank(&candidates, &RankingCriteria::new());
        let ids: Vec<&str> = ranked.iter().map(|r| r.candidate.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn test_truncation_and_min_score() {
        let ranker = CandidateRanker::new();
        let candidates: Vec<Candidate> = (0..10)
            .map(|i| Candidate::new(format!("c{i}"), i as f64 / 10.0, 0.0))
            .collect();

        let top3 = ranker.rank(&candidates, &RankingCriteria::new().with_max_results(3));
        assert_eq!(top3.len(), 3);
        assert_eq!(top3[0].candidate.id, "c9");

        let floor = ranker.rank(&candidates, &RankingCriteria::new().with_min_score(0.5));
        assert!(floor.iter().all(|r| r.score >= 0.5));
        assert_eq!(floor.len(), 2);
    }

    #[test]
    fn test_empty_input_and_inputs_untouched() {
        let ranker = CandidateRanker::new();
        assert!(ranker.rank(&[], &RankingCriteria::new()).is_empty());

        let candidates = vec![Candidate::new("z", 0.1, 0.1), Candidate::new("y", 0.9, 0.9)];
        let before = candidates.clone();
        ranker.rank(&candidates, &RankingCriteria::new());
        assert_eq!(candidates, before);
    }

    #[test]
    fn test_non_finite_features_score_zero() {
        let ranker = CandidateRanker::new();
        let candidate = Candidate::new("nan", f64::NAN, f64::INFINITY);
        assert_eq!(ranker.score(&candidate, &RankingCriteria::new()), 0.0);
    }

    #[test]
    fn test_base_score_is_additive() {
        let ranker = CandidateRanker::new();
        let candidate = Candidate::new("a", 0.0, 0.0).with_base_score(2.0);
        assert!(approx(ranker.score(&candidate, &RankingCriteria::new()), 2.0));
    }

    #[test]
    fn test_repeated_ids_keep_best_score() {
        let ranker = CandidateRanker::new();
        let candidates = vec![
            Candidate::new("dup", 0.1, 0.0),
            Candidate::new("other", 0.5, 0.0),
            Candidate::new("dup", 0.9, 0.0),
        ];
        let ranked = ranker.rank(&candidates, &RankingCriteria::new());
        let ids: Vec<&str> = ranked.iter().map(|r| r.candidate.id.as_str()).collect();
        assert_eq!(ids, vec!["dup", "other"]);
        assert!(approx(ranked[0].score, 0.63));
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn test_rank_where_skips_rejected_and_stops_at_max() {
        let ranker = CandidateRanker::new();
        let candidates: Vec<Candidate> = (0..5)
            .map(|i| Candidate::new(format!("c{i}"), i as f64 / 10.0, 0.0))
            .collect();
        let mut consulted = Vec::new();

        let ranked = ranker.rank_where(&candidates, &RankingCriteria::new().with_max_results(2), |c| {
            consulted.push(c.id.clone());
            c.id != "c4"
        });

        let ids: Vec<&str> = ranked.iter().map(|r| r.candidate.id.as_str()).collect();
        assert_eq!(ids, vec!["c3", "c2"]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(consulted, vec!["c4", "c3", "c2"]);
    }
}
