// src/analyze/classify.rs
//! Topic, content type and quality classification.
//!
//! Everything here is keyword counting plus a handful of source priors:
//! deterministic, cheap, and explainable through the raw per-type scores.

use serde::Serialize;

use super::keywords::{prepare, substring_hits, KeywordSet};
use crate::item::ContentType;

pub const OTHER_TOPIC: &str = "Other";

const PRODUCT_CUES: &[&str] = &[
    "assistant",
    "copilot",
    "workspace",
    "notebook",
    "plugin",
    "desktop app",
    "mobile app",
];

/// Fallback when every type scores zero or below.
const FALLBACK_CONFIDENCE: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct Topic {
    pub name: String,
    pub keywords: KeywordSet,
}

#[derive(Debug, Clone)]
pub struct TagRule {
    pub tag: String,
    pub keywords: KeywordSet,
    pub min_hits: usize,
}

/// Compiled taxonomy. Built once per run from `TaxonomyConfig`.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    pub topics: Vec<Topic>,
    /// Indexed by `ContentType::index()`.
    pub content_types: [KeywordSet; 5],
    pub tag_rules: Vec<TagRule>,
}

impl Taxonomy {
    pub fn type_keywords(&self, ct: ContentType) -> &KeywordSet {
        &self.content_types[ct.index()]
    }
}

/// Raw per-type scores (keyword hits plus priors).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TypeScores([f64; 5]);

impl TypeScores {
    pub fn get(&self, ct: ContentType) -> f64 {
        self.0[ct.index()]
    }

    fn add(&mut self, ct: ContentType, v: f64) {
        self.0[ct.index()] += v;
    }

    /// Highest raw score; the "keyword strength" fed into quality.
    pub fn strongest(&self) -> f64 {
        self.0.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// First type (in `ContentType::ALL` order) with the highest score.
    fn argmax(&self) -> ContentType {
        let mut best = ContentType::ALL[0];
        for ct in ContentType::ALL.into_iter().skip(1) {
            if self.get(ct) > self.get(best) {
                best = ct;
            }
        }
        best
    }
}

/// What the classifier needs to know about an item.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyInput<'a> {
    pub text: &'a str,
    pub source: &'a str,
    pub source_type: &'a str,
    pub url: &'a str,
    pub content_type_hint: Option<&'a str>,
    pub lang: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub topic: String,
    pub relevance_score: f64,
    pub content_type: ContentType,
    pub content_type_confidence: f64,
    pub quality_score: f64,
    pub quality_flags: String,
    pub type_scores: TypeScores,
}

/// Topic with the most keyword hits (first wins ties) and a saturating
/// relevance `1 - 1/(1+hits)`.
pub fn classify_topic(prepared: &str, taxonomy: &Taxonomy) -> (String, f64) {
    let mut best_topic = OTHER_TOPIC;
    let mut best_hits = 0usize;
    for topic in &taxonomy.topics {
        let hits = topic.keywords.hits(prepared);
        if hits > best_hits {
            best_hits = hits;
            best_topic = topic.name.as_str();
        }
    }
    let relevance = 1.0 - 1.0 / (1.0 + best_hits as f64);
    (best_topic.to_string(), relevance)
}

pub fn classify_content_type(
    prepared: &str,
    input: &ClassifyInput<'_>,
    taxonomy: &Taxonomy,
) -> (ContentType, f64, TypeScores) {
    let source = input.source.to_lowercase();
    let url = input.url.to_lowercase();

    let mut scores = TypeScores::default();
    for ct in ContentType::ALL {
        scores.add(ct, taxonomy.type_keywords(ct).hits(prepared) as f64);
    }

    // Source priors.
    if source.contains("arxiv") || url.contains("arxiv.org") {
        scores.add(ContentType::Research, 2.5);
    }
    if source.contains("github_release") || url.contains("/releases/") {
        scores.add(ContentType::Release, 1.8);
        scores.add(ContentType::Tool, 1.2);
    }
    if source.contains("huggingface_model") || url.contains("huggingface.co/") {
        scores.add(ContentType::Release, 1.2);
        scores.add(ContentType::Tool, 0.5);
    }
    if input.source_type.trim().eq_ignore_ascii_case("rss") {
        scores.add(ContentType::News, 0.4);
    }

    // Product language keeps launches of apps from all landing on "release".
    if substring_hits(prepared, PRODUCT_CUES) > 0 {
        scores.add(ContentType::Tool, 1.4);
    }

    if let Some(hint) = input.content_type_hint.and_then(ContentType::parse) {
        scores.add(hint, 1.8);
    }

    let best = scores.argmax();
    let best_score = scores.get(best);
    if best_score <= 0.0 {
        return (ContentType::News, FALLBACK_CONFIDENCE, scores);
    }
    let total: f64 = ContentType::ALL
        .into_iter()
        .map(|ct| scores.get(ct).max(0.0))
        .sum::<f64>()
        + 1e-8;
    let confidence = (best_score / total).clamp(0.0, 1.0);
    (best, confidence, scores)
}

/// Pre-store quality: length, type confidence and keyword strength.
pub fn compute_quality(
    prepared: &str,
    type_confidence: f64,
    keyword_strength: f64,
    lang: &str,
) -> (f64, String) {
    let n_chars = prepared.chars().count();

    let length_score = (n_chars as f64 / 900.0).min(1.0);
    let kw_score = (keyword_strength / 4.0).clamp(0.0, 1.0);
    let conf_score = type_confidence.clamp(0.0, 1.0);

    let q = 0.35 * length_score + 0.40 * conf_score + 0.25 * kw_score;

    let mut flags: Vec<&str> = Vec::new();
    if n_chars < 140 {
        flags.push("too_short");
    }
    if conf_score < 0.33 {
        flags.push("weak_type_conf");
    }
    if kw_score < 0.15 {
        flags.push("weak_keyword_signal");
    }
    if lang == crate::lang::UNKNOWN {
        flags.push("lang_unknown");
    }

    (q.clamp(0.0, 1.0), flags.join(","))
}

pub fn classify_item(input: &ClassifyInput<'_>, taxonomy: &Taxonomy) -> Classification {
    let prepared = prepare(input.text);

    let (topic, mut relevance) = classify_topic(&prepared, taxonomy);
    let (content_type, confidence, type_scores) =
        classify_content_type(&prepared, input, taxonomy);
    let (quality_score, quality_flags) = compute_quality(
        &prepared,
        confidence,
        type_scores.strongest().max(0.0),
        input.lang,
    );

    if content_type.is_high_value() {
        relevance = (relevance + 0.05).min(1.0);
    }

    Classification {
        topic,
        relevance_score: relevance,
        content_type,
        content_type_confidence: confidence,
        quality_score,
        quality_flags,
        type_scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::taxonomy::TaxonomyConfig;

    fn taxonomy() -> Taxonomy {
        TaxonomyConfig::default().compile()
    }

    fn input(text: &str) -> ClassifyInput<'_> {
        ClassifyInput {
            text,
            lang: "en",
            ..Default::default()
        }
    }

    #[test]
    fn topic_defaults_to_other() {
        let t = Taxonomy::default();
        assert_eq!(classify_topic("anything", &t), ("Other".to_string(), 0.0));
    }

    #[test]
    fn topic_first_wins_ties() {
        let t = Taxonomy {
            topics: vec![
                Topic {
                    name: "Agents".into(),
                    keywords: KeywordSet::new(["agent"]),
                },
                Topic {
                    name: "LLM".into(),
                    keywords: KeywordSet::new(["language model"]),
                },
            ],
            ..Default::default()
        };
        let (topic, rel) = classify_topic("an agent built on a language model", &t);
        assert_eq!(topic, "Agents");
        assert!((rel - 0.5).abs() < 1e-9);
    }

    #[test]
    fn arxiv_prior_pushes_research() {
        let t = taxonomy();
        let inp = ClassifyInput {
            url: "https://arxiv.org/abs/2501.00001",
            ..input("A study of scaling behaviour")
        };
        let c = classify_item(&inp, &t);
        assert_eq!(c.content_type, ContentType::Research);
        assert!(c.content_type_confidence > 0.5);
        assert!(c.relevance_score >= 0.05);
    }

    #[test]
    fn no_signal_falls_back_to_news() {
        let c = classify_item(&input("lorem ipsum dolor"), &Taxonomy::default());
        assert_eq!(c.content_type, ContentType::News);
        assert!((c.content_type_confidence - 0.2).abs() < 1e-9);
        assert_eq!(c.relevance_score, 0.0);
        assert!(c.quality_flags.contains("too_short"));
        assert!(c.quality_flags.contains("weak_type_conf"));
        assert!(c.quality_flags.contains("weak_keyword_signal"));
    }

    #[test]
    fn hint_and_product_cues_are_counted() {
        let t = Taxonomy::default();
        let inp = ClassifyInput {
            content_type_hint: Some("industry"),
            ..input("our copilot for contact centers")
        };
        let (ct, _, scores) = classify_content_type(&prepare(inp.text), &inp, &t);
        assert_eq!(scores.get(ContentType::Tool), 1.4);
        assert_eq!(scores.get(ContentType::Industry), 1.8);
        assert_eq!(ct, ContentType::Industry);
    }

    #[test]
    fn argmax_ties_prefer_earlier_types() {
        let mut s = TypeScores::default();
        s.add(ContentType::Release, 2.0);
        s.add(ContentType::Tool, 2.0);
        assert_eq!(s.argmax(), ContentType::Tool);
    }

    #[test]
    fn quality_blends_length_conf_and_strength() {
        let text = "x".repeat(900);
        let (q, flags) = compute_quality(&text, 1.0, 4.0, "en");
        assert!((q - 1.0).abs() < 1e-9);
        assert!(flags.is_empty());

        let (q, flags) = compute_quality("short", 0.5, 0.0, "unknown");
        assert!((q - (0.35 * 5.0 / 900.0 + 0.2)).abs() < 1e-9);
        assert_eq!(flags, "too_short,weak_keyword_signal,lang_unknown");
    }
}
