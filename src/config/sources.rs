// src/config/sources.rs
//! Feed configuration (`sources.toml`).
//!
//! ```toml
//! [rss]
//! enabled = true
//! include_keywords = ["ai", "llm"]
//! exclude_keywords = ["webinar"]
//!
//! [[rss.feeds]]
//! name = "openai_blog"
//! url = "https://openai.com/blog/rss.xml"
//! fetch_fulltext = true
//!
//! [[creators.feeds]]
//! name = "Simone Rizzo"
//! url = "https://example.com/feed.xml"
//!
//! [language_policy]
//! allowed = ["it", "en"]
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::ingest::types::FullTextPolicy;
use crate::item::{Lane, SourceKind};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub rss: RssSection,
    #[serde(default)]
    pub creators: CreatorsSection,
    #[serde(default)]
    pub language_policy: LanguagePolicy,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RssSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub include_keywords: Vec<String>,
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatorsSection {
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
}

/// One `[[rss.feeds]]` / `[[creators.feeds]]` entry. Unset options take
/// the defaults of the section it appears in.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub source_kind: Option<SourceKind>,
    #[serde(default)]
    pub source_weight: Option<f64>,
    #[serde(default)]
    pub creator_name: Option<String>,
    #[serde(default)]
    pub lane_hint: Option<Lane>,
    #[serde(default)]
    pub content_type_hint: Option<String>,
    #[serde(default)]
    pub fetch_fulltext: bool,
    #[serde(default)]
    pub fulltext_min_chars: Option<usize>,
    #[serde(default)]
    pub fulltext_max_chars: Option<usize>,
    #[serde(default)]
    pub fulltext_timeout_s: Option<f64>,
    #[serde(default)]
    pub fulltext_sleep_s: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LanguagePolicy {
    #[serde(default = "default_allowed")]
    pub allowed: Vec<String>,
    #[serde(default = "default_true")]
    pub drop_disallowed: bool,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

fn default_allowed() -> Vec<String> {
    vec!["it".to_string(), "en".to_string()]
}
fn default_true() -> bool {
    true
}
fn default_min_confidence() -> f64 {
    0.60
}

impl Default for LanguagePolicy {
    fn default() -> Self {
        Self {
            allowed: default_allowed(),
            drop_disallowed: true,
            min_confidence: default_min_confidence(),
        }
    }
}

/// A feed with every default resolved, ready to build a collector from.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSpec {
    pub name: String,
    pub url: String,
    pub source_kind: SourceKind,
    pub source_weight: f64,
    pub creator_name: String,
    pub lane_hint: Lane,
    pub content_type_hint: Option<String>,
    pub fulltext: FullTextPolicy,
}

fn secs(v: Option<f64>, fallback: Duration) -> Duration {
    v.and_then(|s| Duration::try_from_secs_f64(s).ok())
        .unwrap_or(fallback)
}

impl FeedConfig {
    fn resolve(&self, kind: SourceKind, lane: Lane, creator_default: &str) -> FeedSpec {
        let d = FullTextPolicy::default();
        let fulltext = FullTextPolicy {
            fetch: self.fetch_fulltext,
            min_chars: self.fulltext_min_chars.unwrap_or(d.min_chars),
            max_chars: self.fulltext_max_chars.unwrap_or(d.max_chars).max(1),
            timeout: secs(self.fulltext_timeout_s, d.timeout),
            politeness_delay: secs(self.fulltext_sleep_s, d.politeness_delay),
        };
        FeedSpec {
            name: self.name.trim().to_string(),
            url: self.url.trim().to_string(),
            source_kind: self.source_kind.unwrap_or(kind),
            source_weight: self.source_weight.unwrap_or(1.0).clamp(0.0, 1.0),
            creator_name: self
                .creator_name
                .clone()
                .unwrap_or_else(|| creator_default.to_string()),
            lane_hint: self.lane_hint.unwrap_or(lane),
            content_type_hint: self
                .content_type_hint
                .clone()
                .filter(|h| !h.trim().is_empty()),
            fulltext,
        }
    }
}

impl SourcesConfig {
    /// Institutional feeds first, then creator feeds. Creator feeds default to
    /// `source_kind = creator`, the scout lane and their own name as creator.
    /// Entries without a URL are skipped.
    pub fn feed_specs(&self) -> Vec<FeedSpec> {
        let institutional = self
            .rss
            .feeds
            .iter()
            .map(|f| f.resolve(SourceKind::Institutional, Lane::Reliable, ""));
        let creators = self
            .creators
            .feeds
            .iter()
            .map(|f| f.resolve(SourceKind::Creator, Lane::Scout, &f.name));
        institutional
            .chain(creators)
            .filter(|s| !s.url.is_empty())
            .collect()
    }

    pub fn sanitize(&mut self) {
        let lp = &mut self.language_policy;
        lp.allowed = lp
            .allowed
            .iter()
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect();
        if !lp.min_confidence.is_finite() {
            lp.min_confidence = default_min_confidence();
        }
        lp.min_confidence = lp.min_confidence.clamp(0.0, 1.0);
    }
}
