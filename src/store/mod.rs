// src/store/mod.rs
//! Persistence for enriched items, keyed by canonical URL.
//!
//! The pipeline needs exactly three operations: a batch existence check, an
//! upsert, and the most recent content texts for the novelty history.

mod libsql_store;
mod memory;
mod migrations;

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::Result;
use crate::item::EnrichedItem;

pub use libsql_store::LibsqlStore;
pub use memory::MemoryStore;

#[async_trait]
pub trait ItemStore: Send + Sync {
    /// The subset of `urls` already persisted.
    async fn existing_urls(&self, urls: &[String]) -> Result<HashSet<String>>;

    /// Insert or replace the row for `item.url`.
    async fn upsert(&self, item: &EnrichedItem) -> Result<()>;

    /// Up to `limit` content texts, newest first by `published_at` (undated
    /// rows last), then by `fetched_at`.
    async fn recent_texts(&self, limit: usize) -> Result<Vec<String>>;
}
