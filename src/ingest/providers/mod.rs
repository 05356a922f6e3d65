// src/ingest/providers/mod.rs
pub mod rss;

pub use rss::{parse_feed, RssCollector};

use crate::config::SourcesConfig;
use crate::ingest::types::Collector;

/// One RSS collector per configured feed (institutional, then creators),
/// sharing `client`. Nothing when `[rss] enabled` is false.
pub fn collectors_from_config(
    sources: &SourcesConfig,
    client: &reqwest::Client,
) -> Vec<Box<dyn Collector>> {
    if !sources.rss.enabled {
        return Vec::new();
    }
    sources
        .feed_specs()
        .into_iter()
        .map(|spec| {
            Box::new(
                RssCollector::http(spec, client.clone())
                    .with_filters(&sources.rss.include_keywords, &sources.rss.exclude_keywords),
            ) as Box<dyn Collector>
        })
        .collect()
}
