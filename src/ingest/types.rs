// src/ingest/types.rs
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::item::{Lane, SourceKind};

/// Per-record full-text policy, carried through from the feed config.
#[derive(Debug, Clone, PartialEq)]
pub struct FullTextPolicy {
    pub fetch: bool,
    pub min_chars: usize,
    pub max_chars: usize,
    pub timeout: Duration,
    pub politeness_delay: Duration,
}

impl Default for FullTextPolicy {
    fn default() -> Self {
        Self {
            fetch: false,
            min_chars: 400,
            max_chars: 6_000,
            timeout: Duration::from_secs(10),
            politeness_delay: Duration::ZERO,
        }
    }
}

/// Raw output of a collector, before any normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRecord {
    pub source: String,      // e.g. "openai_blog", "arxiv"
    pub source_type: String, // "rss", "api", ...
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
    pub fulltext: FullTextPolicy,
    pub lane_hint: Lane,
}

impl CandidateRecord {
    /// Institutional, reliable, weight 1.0, fetched now.
    pub fn new(
        source: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
        content_text: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            source_type: String::new(),
            author_org: String::new(),
            creator_name: String::new(),
            source_kind: SourceKind::Institutional,
            source_weight: 1.0,
            url: url.into(),
            title: title.into(),
            content_text: content_text.into(),
            published_at: None,
            fetched_at: Utc::now(),
            content_type_hint: None,
            fulltext: FullTextPolicy::default(),
            lane_hint: Lane::Reliable,
        }
    }
}

/// A source of candidate records (RSS feed, paper API, release feed...).
#[async_trait::async_trait]
pub trait Collector: Send + Sync {
    async fn collect(&self) -> Result<Vec<CandidateRecord>>;
    fn name(&self) -> &str;
}
