// src/error.rs
use std::path::PathBuf;

/// Errors that cross the library boundary.
///
/// Collector and full-text failures never show up here: they are absorbed
/// per call and surface only in `RunStats`. What remains is fatal for a run.
#[derive(Debug, thiserror::Error)]
pub enum RadarError {
    #[error("required config file missing: {}", path.display())]
    ConfigMissing { path: PathBuf },

    #[error("cannot read config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("store error: {0}")]
    Store(String),
}

impl From<libsql::Error> for RadarError {
    fn from(e: libsql::Error) -> Self {
        RadarError::Store(e.to_string())
    }
}

pub type Result<T, E = RadarError> = std::result::Result<T, E>;
