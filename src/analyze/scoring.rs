//! Priority combination.
//!
//! `ScoreInputs` are six normalized signals in [0,1]. The base priority is a
//! weighted average over the weights that are strictly positive, so a partial
//! weight table still yields a proper convex combination.

use crate::config::ranking::PriorityWeights;
use crate::item::Lane;

/// Trust a scout item needs before it earns the discovery boost.
pub const SCOUT_BOOST_MIN_TRUST: f64 = 0.80;

/// Normalized inputs in [0,1].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScoreInputs {
    pub source_trust: f64,
    pub novelty: f64,
    pub relevance: f64,
    pub actionability: f64,
    pub recency: f64,
    pub source_mix: f64,
}

impl ScoreInputs {
    /// Safe constructor with clamping.
    pub fn new(
        source_trust: f64,
        novelty: f64,
        relevance: f64,
        actionability: f64,
        recency: f64,
        source_mix: f64,
    ) -> Self {
        fn c(x: f64) -> f64 {
            if x.is_nan() {
                0.0
            } else {
                x.clamp(0.0, 1.0)
            }
        }
        Self {
            source_trust: c(source_trust),
            novelty: c(novelty),
            relevance: c(relevance),
            actionability: c(actionability),
            recency: c(recency),
            source_mix: c(source_mix),
        }
    }
}

/// Weighted average over positive weights; 0 when none is positive.
pub fn base_priority(inputs: &ScoreInputs, w: &PriorityWeights) -> f64 {
    let pairs = [
        (w.source_trust, inputs.source_trust),
        (w.novelty, inputs.novelty),
        (w.relevance, inputs.relevance),
        (w.actionability, inputs.actionability),
        (w.recency, inputs.recency),
        (w.source_mix, inputs.source_mix),
    ];

    let mut total = 0.0;
    let mut agg = 0.0;
    for (wk, v) in pairs {
        if wk <= 0.0 || wk.is_nan() {
            continue;
        }
        total += wk;
        agg += wk * v;
    }
    if total <= 0.0 {
        return 0.0;
    }
    (agg / total).clamp(0.0, 1.0)
}

/// Final priority. Trusted scout items get a small additive boost from
/// breakout and novelty, capped at 1.
pub fn final_priority(base: f64, lane: Lane, trust: f64, breakout: f64, novelty: f64) -> f64 {
    if lane == Lane::Scout && trust >= SCOUT_BOOST_MIN_TRUST {
        (base + 0.10 * breakout + 0.06 * novelty).min(1.0)
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_average() {
        let w = PriorityWeights::default();
        let all_one = ScoreInputs::new(1.0, 1.0, 1.0, 1.0, 1.0, 1.0);
        assert!((base_priority(&all_one, &w) - 1.0).abs() < 1e-9);

        let only_trust = ScoreInputs::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        assert!((base_priority(&only_trust, &w) - 0.28).abs() < 1e-9);
    }

    #[test]
    fn non_positive_weights_are_excluded() {
        let w = PriorityWeights {
            source_trust: 1.0,
            novelty: 0.0,
            relevance: -3.0,
            actionability: 0.0,
            recency: 0.0,
            source_mix: 0.0,
        };
        let inputs = ScoreInputs::new(0.7, 1.0, 1.0, 1.0, 1.0, 1.0);
        assert!((base_priority(&inputs, &w) - 0.7).abs() < 1e-9);

        let none = PriorityWeights {
            source_trust: 0.0,
            ..w
        };
        assert_eq!(base_priority(&inputs, &none), 0.0);
    }

    #[test]
    fn inputs_are_clamped() {
        let s = ScoreInputs::new(2.0, -1.0, f64::NAN, 0.5, 0.5, 0.5);
        assert_eq!(s.source_trust, 1.0);
        assert_eq!(s.novelty, 0.0);
        assert_eq!(s.relevance, 0.0);
    }

    #[test]
    fn scout_boost_needs_trust() {
        assert!((final_priority(0.5, Lane::Scout, 0.85, 1.0, 1.0) - 0.66).abs() < 1e-9);
        assert_eq!(final_priority(0.5, Lane::Scout, 0.79, 1.0, 1.0), 0.5);
        assert_eq!(final_priority(0.5, Lane::Reliable, 0.95, 1.0, 1.0), 0.5);
        assert_eq!(final_priority(0.99, Lane::Scout, 0.95, 1.0, 1.0), 1.0);
    }
}
