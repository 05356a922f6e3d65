// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod config;
pub mod error;
pub mod fulltext;
pub mod ingest;
pub mod item;
pub mod lang;
pub mod metrics;
pub mod normalize;
pub mod novelty;
pub mod store;
pub mod trust;

// ---- Re-exports for stable public API ----
pub use crate::config::RadarConfig;
pub use crate::error::{RadarError, Result};
pub use crate::ingest::types::{CandidateRecord, Collector, FullTextPolicy};
pub use crate::ingest::{Pipeline, RunStats};
pub use crate::item::{ContentType, EnrichedItem, Lane, SourceKind};
pub use crate::store::{ItemStore, LibsqlStore, MemoryStore};
