// src/config/ranking.rs
use serde::{Deserialize, Serialize};

/// Gate thresholds, caps and priority weights (`ranking.toml`).
/// Every key is optional; missing keys take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub max_items_per_source_per_run: usize,
    pub fulltext_max_fetch_per_run: usize,

    pub min_trust_core: f64,
    pub min_trust_scout: f64,
    pub min_creator_trust: f64,

    pub min_type_confidence_core: f64,
    pub min_type_confidence_scout: f64,

    pub min_quality_core: f64,
    pub min_quality_scout: f64,

    pub recency_half_life_days: f64,
    pub novelty_compare_last_n: usize,
    pub breakout_promote_threshold: f64,
    /// Sources that earn the discovery prior in the breakout signal.
    pub discovery_sources: Vec<String>,
    /// Creator share of a batch above which creator items lose mix score.
    /// Unset by default.
    pub creator_target_ratio: Option<f64>,

    pub weights: PriorityWeights,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            max_items_per_source_per_run: 30,
            fulltext_max_fetch_per_run: 18,
            min_trust_core: 0.60,
            min_trust_scout: 0.40,
            min_creator_trust: 0.75,
            min_type_confidence_core: 0.28,
            min_type_confidence_scout: 0.33,
            min_quality_core: 0.45,
            min_quality_scout: 0.62,
            recency_half_life_days: 7.0,
            novelty_compare_last_n: 200,
            breakout_promote_threshold: 0.68,
            discovery_sources: vec![
                "github_discovery".to_string(),
                "huggingface_discovery".to_string(),
            ],
            creator_target_ratio: None,
            weights: PriorityWeights::default(),
        }
    }
}

/// Priority weights. A `[weights]` table only uses the keys it lists
/// (missing keys weigh 0); without the table the defaults apply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityWeights {
    #[serde(default)]
    pub source_trust: f64,
    #[serde(default)]
    pub novelty: f64,
    #[serde(default)]
    pub relevance: f64,
    #[serde(default)]
    pub actionability: f64,
    #[serde(default)]
    pub recency: f64,
    #[serde(default)]
    pub source_mix: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            source_trust: 0.28,
            novelty: 0.24,
            relevance: 0.20,
            actionability: 0.14,
            recency: 0.10,
            source_mix: 0.04,
        }
    }
}

impl PriorityWeights {
    fn all(&self) -> [f64; 6] {
        [
            self.source_trust,
            self.novelty,
            self.relevance,
            self.actionability,
            self.recency,
            self.source_mix,
        ]
    }
}

fn unit(x: f64, fallback: f64) -> f64 {
    if x.is_finite() {
        x.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

impl RankingConfig {
    /// Clamp thresholds into [0,1] and repair nonsensical values. Run once at load.
    pub fn sanitize(&mut self) {
        let d = RankingConfig::default();
        self.min_trust_core = unit(self.min_trust_core, d.min_trust_core);
        self.min_trust_scout = unit(self.min_trust_scout, d.min_trust_scout);
        self.min_creator_trust = unit(self.min_creator_trust, d.min_creator_trust);
        self.min_type_confidence_core =
            unit(self.min_type_confidence_core, d.min_type_confidence_core);
        self.min_type_confidence_scout =
            unit(self.min_type_confidence_scout, d.min_type_confidence_scout);
        self.min_quality_core = unit(self.min_quality_core, d.min_quality_core);
        self.min_quality_scout = unit(self.min_quality_scout, d.min_quality_scout);
        self.breakout_promote_threshold =
            unit(self.breakout_promote_threshold, d.breakout_promote_threshold);

        if !self.recency_half_life_days.is_finite() || self.recency_half_life_days <= 0.0 {
            self.recency_half_life_days = d.recency_half_life_days;
        }
        self.creator_target_ratio = self
            .creator_target_ratio
            .filter(|r| r.is_finite())
            .map(|r| r.clamp(0.0, 1.0));
        self.discovery_sources = self
            .discovery_sources
            .iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        // An empty or all-zero weights table would zero every priority.
        if self.weights.all().iter().all(|w| !(*w > 0.0)) {
            self.weights = PriorityWeights::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let c: RankingConfig = toml::from_str("").unwrap();
        assert_eq!(c, RankingConfig::default());
    }

    #[test]
    fn partial_weights_table_only_uses_listed_keys() {
        let mut c: RankingConfig = toml::from_str(
            r#"
            min_quality_core = 0.5
            [weights]
            source_trust = 0.5
            novelty = 0.5
            "#,
        )
        .unwrap();
        c.sanitize();
        assert_eq!(c.min_quality_core, 0.5);
        assert_eq!(c.weights.relevance, 0.0);
        assert_eq!(c.weights.source_trust, 0.5);
    }

    #[test]
    fn sanitize_clamps_and_repairs() {
        let mut c: RankingConfig = toml::from_str(
            r#"
            min_trust_core = 1.5
            recency_half_life_days = -2.0
            creator_target_ratio = 2.0
            discovery_sources = [" GitHub_Discovery ", ""]
            [weights]
            novelty = 0.0
            "#,
        )
        .unwrap();
        c.sanitize();
        assert_eq!(c.min_trust_core, 1.0);
        assert_eq!(c.recency_half_life_days, 7.0);
        assert_eq!(c.creator_target_ratio, Some(1.0));
        assert_eq!(c.discovery_sources, vec!["github_discovery".to_string()]);
        assert_eq!(c.weights, PriorityWeights::default());
    }
}
