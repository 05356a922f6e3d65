// src/analyze/autotag.rs
//! Deterministic tag suggestions from taxonomy tag rules.

use serde::Serialize;

use super::classify::TagRule;
use super::keywords::prepare;

pub const DEFAULT_MAX_TAGS: usize = 5;
const MAX_REASON_KEYWORDS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagSuggestion {
    pub tag: String,
    pub hits: usize,
    /// e.g. `match(2): agent, tool calling`
    pub reason: String,
}

/// Rules firing on `text`, most hits first (stable), at most `max_tags`.
pub fn suggest_tags(text: &str, rules: &[TagRule], max_tags: usize) -> Vec<TagSuggestion> {
    let prepared = prepare(text);

    let mut scored: Vec<TagSuggestion> = rules
        .iter()
        .filter(|r| !r.tag.is_empty())
        .filter_map(|r| {
            let hits = r.keywords.hits(&prepared);
            if hits == 0 || hits < r.min_hits {
                return None;
            }
            let matched = r.keywords.matched(&prepared);
            let shown: Vec<&str> = matched.into_iter().take(MAX_REASON_KEYWORDS).collect();
            let reason = if shown.is_empty() {
                format!("match({hits})")
            } else {
                format!("match({hits}): {}", shown.join(", "))
            };
            Some(TagSuggestion {
                tag: r.tag.clone(),
                hits,
                reason,
            })
        })
        .collect();

    scored.sort_by(|a, b| b.hits.cmp(&a.hits));
    scored.truncate(max_tags);
    scored
}
