//! Proptest strategies for ranking inputs.

#![allow(dead_code)]

use pipeline_core::models::{Candidate, RankingCriteria};
use proptest::prelude::*;

pub fn candidate_strategy() -> impl Strategy<Value = Candidate> {
    (
        "[a-z]{1,8}",
        0.0_f64..=1.0,
        0.0_f64..=1.0,
        0.0_f64..100.0,
        prop::sample::select(vec!["email", "social", "print"]),
    )
        .prop_map(|(id, popularity, velocity, price, channel)| {
            Candidate::new(id, popularity, velocity)
                .with_numeric("price", price)
                .with_category("channel", channel)
        })
}

pub fn candidates_strategy() -> impl Strategy<Value = Vec<Candidate>> {
    prop::collection::vec(candidate_strategy(), 0..40)
}

/// Candidates drawn from a handful of ids, so repeats are common
pub fn colliding_candidates_strategy() -> impl Strategy<Value = Vec<Candidate>> {
    prop::collection::vec(
        (prop::sample::select(vec!["a", "b", "c"]), candidate_strategy())
            .prop_map(|(id, candidate)| Candidate { id: id.to_string(), ..candidate }),
        0..20,
    )
}

pub fn criteria_strategy() -> impl Strategy<Value = RankingCriteria> {
    (
        prop::option::of(0.0_f64..100.0),
        prop::option::of(prop::sample::select(vec!["email", "social", "print"])),
        prop::option::of(1_usize..20),
        prop::option::of(0.0_f64..1.0),
    )
        .prop_map(|(target, channel, max_results, min_score)| {
            let mut criteria = RankingCriteria::new();
            if let Some(target) = target {
                criteria = criteria.with_numeric_target("price", target);
            }
            if let Some(channel) = channel {
                criteria = criteria.with_category("channel", channel);
            }
            if let Some(max_results) = max_results {
                criteria = criteria.with_max_results(max_results);
            }
            if let Some(min_score) = min_score {
                criteria = criteria.with_min_score(min_score);
            }
            criteria
        })
}
