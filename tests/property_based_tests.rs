mod common;

use common::strategies::*;
use pipeline_core::services::CandidateRanker;
use proptest::prelude::*;
use std::collections::HashSet;

proptest! {
    /// Property: ranking the same input twice gives the same ordering
    #[test]
    fn ranking_is_deterministic(candidates in candidates_strategy(), criteria in criteria_strategy()) {
        let ranker = CandidateRanker::new();
        let first = ranker.rank(&candidates, &criteria);
        let second = ranker.rank(&candidates, &criteria);
        prop_assert_eq!(first, second);
    }

    /// Property: input order does not change the ranking
    #[test]
    fn ranking_ignores_input_order(candidates in candidates_strategy(), criteria in criteria_strategy()) {
        let ranker = CandidateRanker::new();
        let mut reversed = candidates.clone();
        reversed.reverse();

        let forward: Vec<(String, f64)> = ranker
            .rank(&candidates, &criteria)
            .into_iter()
            .map(|r| (r.candidate.id, r.score))
            .collect();
        let backward: Vec<(String, f64)> = ranker
            .rank(&reversed, &criteria)
            .into_iter()
            .map(|r| (r.candidate.id, r.score))
            .collect();
        prop_assert_eq!(forward, backward);
    }

    /// Property: scores never increase down the ranking and ties are ordered by id
    #[test]
    fn ranking_is_sorted(candidates in candidates_strategy(), criteria in criteria_strategy()) {
        let ranked = CandidateRanker::new().rank(&candidates, &criteria);
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
            if pair[0].score == pair[1].score {
                prop_assert!(pair[0].candidate.id <= pair[1].candidate.id);
            }
        }
        for (index, entry) in ranked.iter().enumerate() {
            prop_assert_eq!(entry.rank, index + 1);
        }
    }

    /// Property: max_results and min_score are respected
    #[test]
    fn ranking_respects_limits(candidates in candidates_strategy(), criteria in criteria_strategy()) {
        let ranked = CandidateRanker::new().rank(&candidates, &criteria);
        prop_assert!(ranked.len() <= candidates.len());
        if let Some(max) = criteria.max_results {
            prop_assert!(ranked.len() <= max);
        }
        if let Some(min) = criteria.min_score {
            prop_assert!(ranked.iter().all(|r| r.score >= min));
        }
    }

    /// Property: an id appears at most once, carrying its best score
    #[test]
    fn ranking_yields_each_id_once(candidates in colliding_candidates_strategy(), criteria in criteria_strategy()) {
        let ranker = CandidateRanker::new();
        let ranked = ranker.rank(&candidates, &criteria);

        let ids: HashSet<&str> = ranked.iter().map(|r| r.candidate.id.as_str()).collect();
        prop_assert_eq!(ids.len(), ranked.len());

        for entry in &ranked {
            let best = candidates
                .iter()
                .filter(|c| c.id == entry.candidate.id)
                .map(|c| ranker.score(c, &criteria))
                .fold(f64::NEG_INFINITY, f64::max);
            prop_assert_eq!(entry.score, best);
        }
    }
}
