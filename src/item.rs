// src/item.rs
//! Enriched news items and the small closed vocabularies they carry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::types::CandidateRecord;

/// Reliability lane. `Scout` holds early, less-proven discoveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lane {
    #[default]
    Reliable,
    Scout,
}

impl Lane {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lane::Reliable => "reliable",
            Lane::Scout => "scout",
        }
    }

    /// Anything that is not literally "scout" is reliable.
    pub fn parse(s: &str) -> Lane {
        if s.trim().eq_ignore_ascii_case("scout") {
            Lane::Scout
        } else {
            Lane::Reliable
        }
    }

    /// One-way promotion: a scout never goes back to reliable.
    pub fn escalate(self, promote: bool) -> Lane {
        if promote {
            Lane::Scout
        } else {
            self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Institutional,
    Creator,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Institutional => "institutional",
            SourceKind::Creator => "creator",
        }
    }

    pub fn parse(s: &str) -> SourceKind {
        if s.trim().eq_ignore_ascii_case("creator") {
            SourceKind::Creator
        } else {
            SourceKind::Institutional
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Tool,
    Research,
    Release,
    Industry,
    #[default]
    News,
}

impl ContentType {
    /// Fixed order; argmax ties resolve to the earliest entry.
    pub const ALL: [ContentType; 5] = [
        ContentType::Tool,
        ContentType::Research,
        ContentType::Release,
        ContentType::Industry,
        ContentType::News,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Tool => "tool",
            ContentType::Research => "research",
            ContentType::Release => "release",
            ContentType::Industry => "industry",
            ContentType::News => "news",
        }
    }

    pub fn parse(s: &str) -> Option<ContentType> {
        let s = s.trim();
        ContentType::ALL
            .into_iter()
            .find(|ct| ct.as_str().eq_ignore_ascii_case(s))
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }

    /// Types that earn the small relevance bonus.
    pub fn is_high_value(&self) -> bool {
        !matches!(self, ContentType::News)
    }
}

/// A candidate after enrichment. This is the persisted unit, keyed by `url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedItem {
    pub id: String,
    pub source: String,
    pub source_type: String,
    pub author_org: String,
    pub creator_name: String,
    pub source_kind: SourceKind,
    pub source_weight: f64,
    pub url: String,
    pub title: String,
    pub content_text: String,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
    pub content_type_hint: Option<String>,
    pub lane_hint: Lane,

    pub lang: String,
    pub lang_confidence: f64,
    pub lang_method: String,
    pub fulltext_method: Option<String>,

    pub topic: String,
    pub relevance_score: f64,
    pub content_type: ContentType,
    pub content_type_confidence: f64,
    pub quality_score: f64,
    pub quality_flags: String,
    pub suggested_tags: Vec<String>,
    /// Why each suggested tag fired, index-aligned with `suggested_tags`.
    pub tag_reasons: Vec<String>,

    pub source_trust_score: f64,
    pub recency_score: f64,
    pub actionability_score: f64,
    pub source_mix_score: f64,
    pub novelty_score: f64,
    pub breakout_signal: f64,
    pub priority_score: f64,

    pub lane: Lane,
    pub status: String,
}

pub const DEFAULT_STATUS: &str = "new";

impl EnrichedItem {
    /// Seed an item from a (normalized) candidate. Scores start at zero and
    /// are filled by the pipeline stages.
    pub fn from_candidate(rec: CandidateRecord) -> Self {
        let lane = rec.lane_hint;
        Self {
            id: stable_id(&rec.url),
            source: rec.source,
            source_type: rec.source_type,
            author_org: rec.author_org,
            creator_name: rec.creator_name,
            source_kind: rec.source_kind,
            source_weight: rec.source_weight.clamp(0.0, 1.0),
            url: rec.url,
            title: rec.title,
            content_text: rec.content_text,
            published_at: rec.published_at,
            fetched_at: rec.fetched_at,
            content_type_hint: rec.content_type_hint,
            lane_hint: lane,
            lang: "unknown".to_string(),
            lang_confidence: 0.0,
            lang_method: String::new(),
            fulltext_method: None,
            topic: "Other".to_string(),
            relevance_score: 0.0,
            content_type: ContentType::News,
            content_type_confidence: 0.0,
            quality_score: 0.0,
            quality_flags: String::new(),
            suggested_tags: Vec::new(),
            tag_reasons: Vec::new(),
            source_trust_score: 0.0,
            recency_score: 0.0,
            actionability_score: 0.0,
            source_mix_score: 0.0,
            novelty_score: 0.0,
            breakout_signal: 0.0,
            priority_score: 0.0,
            lane,
            status: DEFAULT_STATUS.to_string(),
        }
    }

    /// `"{title} {content}"`: input for language, classification and breakout.
    pub fn text_blob(&self) -> String {
        format!("{} {}", self.title, self.content_text)
    }

    /// `"{title}. {content}"`: input for the novelty encoder.
    pub fn embedding_text(&self) -> String {
        format!("{}. {}", self.title, self.content_text)
    }

    /// Lowercased, trimmed source key used for caps and mix shares.
    pub fn source_key(&self) -> String {
        source_key(&self.source)
    }
}

pub(crate) fn source_key(source: &str) -> String {
    let s = source.trim().to_lowercase();
    if s.is_empty() {
        "unknown".to_string()
    } else {
        s
    }
}

/// Stable identifier: first 16 bytes of SHA-256 over the canonical URL, hex.
pub fn stable_id(canonical_url: &str) -> String {
    hex_digest(canonical_url, 16)
}

/// Short digest for log lines; never log the URL or text itself.
pub(crate) fn anon_hash(text: &str) -> String {
    hex_digest(text, 6)
}

fn hex_digest(text: &str, bytes: usize) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;

    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(bytes * 2);
    for b in digest.iter().take(bytes) {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
