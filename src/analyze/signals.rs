// src/analyze/signals.rs
//! Per-item ranking signals: recency, actionability, source mix and breakout.
//! All outputs are clamped to [0, 1].

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::keywords::substring_hits;
use crate::item::{source_key, SourceKind};

/// Recency used when an item carries no publication date.
pub const MISSING_DATE_RECENCY: f64 = 0.4;

const ACTIONABLE_KEYWORDS: &[&str] = &[
    "code",
    "repo",
    "github",
    "pip install",
    "docker",
    "demo",
    "benchmark",
    "weights",
    "checkpoint",
    "api",
    "sdk",
    "release",
    "model card",
    "tutorial",
    "example",
    "notebook",
    "colab",
    "cli",
];

const PRODUCT_KEYWORDS: &[&str] = &[
    "assistant",
    "copilot",
    "workspace",
    "notebook",
    "voice",
    "speech",
    "transcription",
    "browser",
    "agentic",
    "automation",
];

/// Share above which a single source starts losing mix score.
const FLOOD_SHARE: f64 = 0.20;
const FLOOD_SLOPE: f64 = 0.75;
const FLOOD_MAX_PENALTY: f64 = 0.18;

pub(crate) fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Exponential decay with the given half-life. Future dates count as fresh.
pub fn recency_score(
    published_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    half_life_days: f64,
) -> f64 {
    let Some(published) = published_at else {
        return MISSING_DATE_RECENCY;
    };
    let age_days = ((now - published).num_milliseconds() as f64 / 86_400_000.0).max(0.0);
    let half_life = half_life_days.max(0.1);
    clamp01((-(std::f64::consts::LN_2) * age_days / half_life).exp())
}

/// Fixed URL bonuses for code, model hub and paper hosts plus capped keyword hits.
pub fn actionability_score(text: &str, url: &str) -> f64 {
    let t = text.to_lowercase();
    let u = url.to_lowercase();

    let mut score = 0.0;
    if u.contains("github.com") {
        score += 0.40;
    }
    if u.contains("huggingface.co") {
        score += 0.35;
    }
    if u.contains("arxiv.org") {
        score += 0.20;
    }
    let hits = substring_hits(&t, ACTIONABLE_KEYWORDS);
    score += (hits as f64 * 0.07).min(0.40);
    clamp01(score)
}

/// Source counts over the batch that survived the trust gate.
#[derive(Debug, Clone, Default)]
pub struct SourceShares {
    counts: HashMap<String, usize>,
    total: usize,
    creators: usize,
}

impl SourceShares {
    pub fn from_items<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, SourceKind)>,
    {
        let mut out = Self::default();
        for (source, kind) in items {
            *out.counts.entry(source_key(source)).or_insert(0) += 1;
            out.total += 1;
            if kind == SourceKind::Creator {
                out.creators += 1;
            }
        }
        out
    }

    /// Fraction of the batch coming from `source` (a lone item counts as one).
    pub fn share(&self, source: &str) -> f64 {
        let total = self.total.max(1);
        let count = self.counts.get(&source_key(source)).copied().unwrap_or(1);
        count as f64 / total as f64
    }

    pub fn creator_share(&self) -> f64 {
        self.creators as f64 / self.total.max(1) as f64
    }
}

/// Anti-flood mix score. Never rewards weak sources: the base is driven by
/// trust and weight, and over-represented sources are penalized linearly.
pub fn source_mix_score(
    share: f64,
    source_kind: SourceKind,
    source_weight: f64,
    trust: f64,
    creator_penalty: f64,
) -> f64 {
    let mut base = 0.55 + 0.25 * clamp01(trust) + 0.10 * clamp01(source_weight);
    if source_kind == SourceKind::Creator {
        base -= 0.05;
        base -= creator_penalty;
    }
    let over = (share - FLOOD_SHARE).max(0.0);
    base -= (over * FLOOD_SLOPE).min(FLOOD_MAX_PENALTY);
    clamp01(base)
}

/// Extra mix penalty for creator items once creators exceed `target` of the
/// batch. `None` disables it.
pub fn creator_ratio_penalty(creator_share: f64, target: Option<f64>) -> f64 {
    match target {
        Some(t) => ((creator_share - t).max(0.0) * FLOOD_SLOPE).min(FLOOD_MAX_PENALTY),
        None => 0.0,
    }
}

/// Early-signal score: discovery-source prior, product language, and the
/// novelty/recency/actionability blend.
pub fn breakout_signal(
    text: &str,
    source: &str,
    discovery_sources: &[String],
    novelty: f64,
    recency: f64,
    actionability: f64,
) -> f64 {
    let t = text.to_lowercase();
    let s = source.trim().to_lowercase();

    let mut score = 0.0;
    if discovery_sources.iter().any(|d| d.eq_ignore_ascii_case(&s)) {
        score += 0.30;
    }
    let hits = substring_hits(&t, PRODUCT_KEYWORDS);
    score += (0.04 * hits as f64).min(0.25);

    score += 0.25 * clamp01(novelty);
    score += 0.15 * clamp01(recency);
    score += 0.20 * clamp01(actionability);
    clamp01(score)
}
