//! TOML configuration for the preparation pipeline.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::crs::Crs;
use crate::error::{PrepError, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub input: InputConfig,
    pub regions: RegionsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// The raw tree inventory CSV.
    pub trees_csv: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RegionsConfig {
    /// Directory holding the combined region cache file.
    pub cache_dir: PathBuf,

    #[serde(default = "default_cache_file")]
    pub cache_file: String,

    /// Fixed by design to EPSG:27700; configs naming another target are
    /// rejected at load time.
    #[serde(default = "default_target_crs")]
    pub target_crs: String,

    /// Geometry sources in assembly order. The order is load-bearing: it
    /// fixes the region iteration order used for classification tie-breaks.
    pub sources: Vec<SourceConfig>,
}

fn default_cache_file() -> String {
    "region_polygons.geojson".to_string()
}

fn default_target_crs() -> String {
    "EPSG:27700".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// Short source key used in logs and error messages.
    pub key: String,
    /// Path to the vector file (.shp or .geojson).
    pub path: PathBuf,
    /// Declared CRS of the source geometry, e.g. "EPSG:4326".
    pub crs: String,
    #[serde(flatten)]
    pub kind: SourceKind,
}

/// Source-specific selection and schema-normalization behavior.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceKind {
    /// A NUTS statistical-units export. The UK/Ireland selection predicate
    /// applies and the NUTS attribute names are assumed.
    Nuts,
    /// A single-country boundary file. All features are taken; the unit id
    /// doubles as the country code.
    Admin0 { id_field: String, name_field: String },
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// Directory receiving the timestamped base and marker tables.
    pub dir: PathBuf,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| PrepError::io(path, e))?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            PrepError::Configuration(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.regions.sources.is_empty() {
            return Err(PrepError::Configuration(
                "no region sources configured".to_string(),
            ));
        }
        if self.regions.target()? != Crs::BritishNationalGrid {
            return Err(PrepError::Configuration(format!(
                "target_crs must be EPSG:27700, got '{}'",
                self.regions.target_crs
            )));
        }
        for source in &self.regions.sources {
            Crs::parse(&source.crs)?;
        }
        Ok(())
    }
}

impl RegionsConfig {
    pub fn cache_path(&self) -> PathBuf {
        self.cache_dir.join(&self.cache_file)
    }

    pub fn target(&self) -> Result<Crs> {
        Crs::parse(&self.target_crs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
        [input]
        trees_csv = "./data/ati.csv"

        [regions]
        cache_dir = "./data/regions"

        [[regions.sources]]
        key = "uki"
        path = "./data/nuts/NUTS_RG_20M_2021_3035.shp"
        crs = "EPSG:3035"
        kind = "nuts"

        [[regions.sources]]
        key = "iom"
        path = "./data/iom/boundary.shp"
        crs = "EPSG:4326"
        kind = "admin0"
        id_field = "iso"
        name_field = "name_fao"

        [output]
        dir = "./data/out"
    "#;

    #[test]
    fn parses_example_config() {
        let config: Config = toml::from_str(EXAMPLE).unwrap();
        config.validate().unwrap();
        assert_eq!(config.regions.sources.len(), 2);
        assert_eq!(config.regions.cache_file, "region_polygons.geojson");
        assert!(matches!(config.regions.sources[0].kind, SourceKind::Nuts));
        match &config.regions.sources[1].kind {
            SourceKind::Admin0 { id_field, name_field } => {
                assert_eq!(id_field, "iso");
                assert_eq!(name_field, "name_fao");
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn rejects_foreign_target_crs() {
        let toml = EXAMPLE.replace(
            "cache_dir = \"./data/regions\"",
            "cache_dir = \"./data/regions\"\ntarget_crs = \"EPSG:4326\"",
        );
        let config: Config = toml::from_str(&toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("target_crs"));
    }

    #[test]
    fn rejects_empty_sources() {
        let toml = r#"
            [input]
            trees_csv = "a.csv"
            [regions]
            cache_dir = "r"
            sources = []
            [output]
            dir = "out"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.validate().is_err());
    }
}
