// src/analyze/mod.rs
//! Per-item analysis: keyword classification, tag suggestions, ranking
//! signals and the priority combination.

pub mod autotag;
pub mod classify;
pub mod keywords;
pub mod scoring;
pub mod signals;

pub use classify::{classify_item, Classification, ClassifyInput, Taxonomy};
pub use scoring::{base_priority, final_priority, ScoreInputs};
