// src/store/memory.rs
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::ItemStore;
use crate::error::{RadarError, Result};
use crate::item::EnrichedItem;

/// Process-local store. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, EnrichedItem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, EnrichedItem>>> {
        self.items
            .lock()
            .map_err(|_| RadarError::Store("memory store mutex poisoned".into()))
    }

    pub fn get(&self, url: &str) -> Option<EnrichedItem> {
        self.lock().ok()?.get(url).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every stored item, in recency order.
    pub fn items(&self) -> Vec<EnrichedItem> {
        let mut all: Vec<EnrichedItem> = match self.lock() {
            Ok(m) => m.values().cloned().collect(),
            Err(_) => return Vec::new(),
        };
        sort_recent_first(&mut all);
        all
    }
}

/// `published_at DESC NULLS LAST, fetched_at DESC`.
fn sort_recent_first(items: &mut [EnrichedItem]) {
    items.sort_by(|a, b| {
        match (b.published_at, a.published_at) {
            (Some(pb), Some(pa)) => pb.cmp(&pa),
            (Some(_), None) => std::cmp::Ordering::Greater,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (None, None) => std::cmp::Ordering::Equal,
        }
        .then_with(|| b.fetched_at.cmp(&a.fetched_at))
    });
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn existing_urls(&self, urls: &[String]) -> Result<HashSet<String>> {
        let map = self.lock()?;
        Ok(urls
            .iter()
            .filter(|u| map.contains_key(u.as_str()))
            .cloned()
            .collect())
    }

    async fn upsert(&self, item: &EnrichedItem) -> Result<()> {
        self.lock()?.insert(item.url.clone(), item.clone());
        Ok(())
    }

    async fn recent_texts(&self, limit: usize) -> Result<Vec<String>> {
        Ok(self
            .items()
            .into_iter()
            .take(limit)
            .map(|i| i.content_text)
            .collect())
    }
}
