//! Error taxonomy for the preparation pipeline.
//!
//! Failures are deterministic given the same inputs, so every error is fatal
//! for the run: nothing is retried and no partial region cache is written.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrepError {
    /// A declared input is missing/unreadable, the cache path is unwritable,
    /// or the configuration itself is invalid (unknown CRS, empty sources).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A source's expected identifier/name attributes are absent after
    /// normalization. Fatal: assembly aborts rather than producing an
    /// incomplete region set.
    #[error("schema error in source '{source_key}': {message}")]
    Schema { source_key: String, message: String },

    /// One or more point records carry missing or non-finite coordinates.
    /// The whole run is rejected; every offending id is named.
    #[error("invalid coordinates for {} record(s): {}", ids.len(), ids.join(", "))]
    Data { ids: Vec<String> },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("shapefile error: {0}")]
    Shapefile(#[from] shapefile::Error),

    #[error("geojson error: {0}")]
    GeoJson(#[from] geojson::Error),
}

impl PrepError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PrepError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn schema(source: impl Into<String>, message: impl Into<String>) -> Self {
        PrepError::Schema {
            source_key: source.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PrepError>;
