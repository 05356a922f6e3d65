// src/ingest/stats.rs
use std::collections::BTreeMap;

use serde::Serialize;

use crate::item::{ContentType, Lane};

/// What one collector contributed to a run. `error` holds the error chain
/// only, never record content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectorOutcome {
    pub name: String,
    pub items: usize,
    pub error: Option<String>,
}

/// Counters for one pipeline run. Counts only: no text, no URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Raw records returned by the collectors.
    pub fetched: usize,
    /// Records left after dedup and the per-source cap.
    pub new_items: usize,
    pub skipped_existing: usize,
    pub skipped_language: usize,
    pub skipped_trust: usize,
    pub skipped_type_confidence: usize,
    pub skipped_quality: usize,
    pub stored: usize,
    pub fulltext_fetched: usize,
    pub lane_counts: BTreeMap<String, usize>,
    pub content_type_counts: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub collectors: Vec<CollectorOutcome>,
}

impl RunStats {
    pub(crate) fn record_stored(&mut self, lane: Lane, content_type: ContentType) {
        self.stored += 1;
        *self.lane_counts.entry(lane.as_str().to_string()).or_insert(0) += 1;
        *self
            .content_type_counts
            .entry(content_type.as_str().to_string())
            .or_insert(0) += 1;
    }

    pub fn lane_count(&self, lane: Lane) -> usize {
        self.lane_counts.get(lane.as_str()).copied().unwrap_or(0)
    }

    pub fn collector_errors(&self) -> usize {
        self.collectors.iter().filter(|c| c.error.is_some()).count()
    }
}
