// src/config/mod.rs
//! Configuration bundle loaded from a directory of TOML files:
//!
//! - `sources.toml`, `trust.toml`, `taxonomy.toml`, `ranking.toml` (required)
//! - `editorial_whitelist.toml` (optional, merged into trust)
//!
//! The directory comes from `$RADAR_CONFIG_DIR`, falling back to `configs/`.

pub mod ranking;
pub mod sources;
pub mod taxonomy;

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::{RadarError, Result};
use crate::trust::{EditorialWhitelist, TrustConfig};

pub use ranking::{PriorityWeights, RankingConfig};
pub use sources::{FeedSpec, LanguagePolicy, SourcesConfig};
pub use taxonomy::TaxonomyConfig;

pub const ENV_CONFIG_DIR: &str = "RADAR_CONFIG_DIR";
pub const DEFAULT_CONFIG_DIR: &str = "configs";

const EDITORIAL_FILE: &str = "editorial_whitelist.toml";

/// Immutable configuration for one run.
#[derive(Debug, Clone, Default)]
pub struct RadarConfig {
    pub sources: SourcesConfig,
    pub trust: TrustConfig,
    pub taxonomy: TaxonomyConfig,
    pub ranking: RankingConfig,
}

/// `$RADAR_CONFIG_DIR` when set and non-empty, else `configs/`.
pub fn config_dir_from_env() -> PathBuf {
    match std::env::var(ENV_CONFIG_DIR) {
        Ok(p) if !p.trim().is_empty() => PathBuf::from(p.trim()),
        _ => PathBuf::from(DEFAULT_CONFIG_DIR),
    }
}

impl RadarConfig {
    /// Load every file from `dir`. A missing required file is an error; the
    /// editorial whitelist is merged only when present.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut sources: SourcesConfig = read_required(&dir.join("sources.toml"))?;
        let mut trust: TrustConfig = read_required(&dir.join("trust.toml"))?;
        let taxonomy: TaxonomyConfig = read_required(&dir.join("taxonomy.toml"))?;
        let mut ranking: RankingConfig = read_required(&dir.join("ranking.toml"))?;

        if let Some(editorial) = read_optional::<EditorialWhitelist>(&dir.join(EDITORIAL_FILE))? {
            tracing::info!(
                target: "radar",
                creators = editorial.creators.len(),
                orgs = editorial.orgs.len(),
                "editorial whitelist merged"
            );
            trust.merge_editorial(&editorial);
        }

        sources.sanitize();
        trust.sanitize();
        ranking.sanitize();

        Ok(Self {
            sources,
            trust,
            taxonomy,
            ranking,
        })
    }

    pub fn load_default() -> Result<Self> {
        Self::load(&config_dir_from_env())
    }
}

fn read_required<T: DeserializeOwned>(path: &Path) -> Result<T> {
    read_optional(path)?.ok_or_else(|| RadarError::ConfigMissing {
        path: path.to_path_buf(),
    })
}

fn read_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| RadarError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed = toml::from_str(&content).map_err(|source| RadarError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(parsed))
}
