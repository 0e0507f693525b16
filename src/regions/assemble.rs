//! Assembling, enriching and caching the combined region set.

use geo_types::{Geometry, MultiPolygon};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::info;

use super::sources::{load_source, RawUnit};
use crate::config::RegionsConfig;
use crate::error::{PrepError, Result};
use crate::models::{Region, RegionSet};

/// Countries recognizable from region name text.
static COUNTRY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("England|Scotland|Wales|Northern Ireland|Isle of Man|Guernsey")
        .expect("valid country pattern")
});

/// Build or load the combined region set.
///
/// If the cache file already exists it is loaded and returned verbatim; the
/// sources are not touched. Region geometry is expensive to build and only
/// changes when the source files change, so the cache is trusted once
/// present — delete the file to invalidate it.
pub fn assemble(config: &RegionsConfig) -> Result<RegionSet> {
    let cache_path = config.cache_path();
    if cache_path.exists() {
        info!("Loading cached region set from {}", cache_path.display());
        return load_cache(&cache_path);
    }

    info!(
        "No region cache at {}; assembling from {} sources",
        cache_path.display(),
        config.sources.len()
    );

    let mut regions = Vec::new();
    for source in &config.sources {
        for unit in load_source(source)? {
            regions.push(enrich(unit));
        }
    }
    let set = RegionSet::new(regions)?;

    if set.is_empty() {
        return Err(PrepError::Configuration(
            "assembly selected no regions from the configured sources".to_string(),
        ));
    }

    write_cache(&cache_path, &set)?;
    info!(
        "Assembled {} regions, cached to {}",
        set.len(),
        cache_path.display()
    );

    Ok(set)
}

/// Derive the country enrichment columns for one normalized unit.
fn enrich(unit: RawUnit) -> Region {
    let country = derive_country(&unit.region_id, &unit.country_code, &unit.region_name);
    let country_high_level = high_level(&country);
    Region {
        region_id: unit.region_id,
        region_name: unit.region_name,
        country_code: unit.country_code,
        country,
        country_high_level,
        geometry: unit.geometry,
    }
}

/// Country from region name text, with source-specific overrides for known
/// anomalies: Irish units carry no country in their names, and Scottish
/// level-2 names do not all mention Scotland.
fn derive_country(region_id: &str, country_code: &str, region_name: &str) -> String {
    if country_code == "IE" {
        return "Republic of Ireland".to_string();
    }
    if region_id.contains("UKM") {
        return "Scotland".to_string();
    }
    match COUNTRY_PATTERN.find(region_name) {
        Some(m) => m.as_str().to_string(),
        // English level-1 unit names (e.g. "North East") carry no country.
        None => "England".to_string(),
    }
}

/// The four home nations collapse to the umbrella value; everything else
/// passes through unchanged.
fn high_level(country: &str) -> String {
    match country {
        "England" | "Scotland" | "Wales" | "Northern Ireland" => "UK".to_string(),
        other => other.to_string(),
    }
}

/// Write the combined region set as a GeoJSON FeatureCollection.
///
/// Feature order is the assembly order and is preserved by the cache, so a
/// cached run keeps the same tie-break behavior as the run that built it.
pub fn write_cache(path: &Path, regions: &RegionSet) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            PrepError::Configuration(format!(
                "cache directory {} unwritable: {e}",
                parent.display()
            ))
        })?;
    }

    let features = regions
        .iter()
        .map(|region| {
            let mut properties = geojson::JsonObject::new();
            properties.insert("region_id".to_string(), region.region_id.clone().into());
            properties.insert("region_name".to_string(), region.region_name.clone().into());
            properties.insert(
                "country_code".to_string(),
                region.country_code.clone().into(),
            );
            properties.insert("country".to_string(), region.country.clone().into());
            properties.insert(
                "country_high_level".to_string(),
                region.country_high_level.clone().into(),
            );
            geojson::Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(
                    &region.geometry,
                ))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    let collection = geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };

    fs::write(path, geojson::GeoJson::from(collection).to_string())
        .map_err(|e| PrepError::Configuration(format!("cache {} unwritable: {e}", path.display())))
}

/// Load a previously written region cache, preserving feature order.
pub fn load_cache(path: &Path) -> Result<RegionSet> {
    let content = fs::read_to_string(path).map_err(|e| PrepError::io(path, e))?;
    let geojson: geojson::GeoJson = content.parse()?;
    let collection = match geojson {
        geojson::GeoJson::FeatureCollection(fc) => fc,
        _ => {
            return Err(PrepError::schema(
                "cache",
                "expected a GeoJSON FeatureCollection",
            ))
        }
    };

    let mut regions = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        let geometry = feature
            .geometry
            .ok_or_else(|| PrepError::schema("cache", "feature without geometry"))?;
        let converted: Geometry<f64> = geometry.value.try_into()?;
        let geometry = match converted {
            Geometry::MultiPolygon(mp) => mp,
            Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
            _ => return Err(PrepError::schema("cache", "feature is not a polygon")),
        };

        let props = feature
            .properties
            .ok_or_else(|| PrepError::schema("cache", "feature without properties"))?;
        let prop = |field: &str| -> Result<String> {
            match props.get(field) {
                Some(serde_json::Value::String(s)) => Ok(s.clone()),
                _ => Err(PrepError::schema(
                    "cache",
                    format!("missing property '{field}'"),
                )),
            }
        };

        regions.push(Region {
            region_id: prop("region_id")?,
            region_name: prop("region_name")?,
            country_code: prop("country_code")?,
            country: prop("country")?,
            country_high_level: prop("country_high_level")?,
            geometry,
        });
    }

    RegionSet::new(regions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SourceConfig, SourceKind};
    use geo::polygon;
    use std::path::PathBuf;

    fn square(origin_x: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: origin_x, y: 0.0),
            (x: origin_x + 10.0, y: 0.0),
            (x: origin_x + 10.0, y: 10.0),
            (x: origin_x, y: 10.0),
        ]])
    }

    fn sample_set() -> RegionSet {
        let units = vec![
            RawUnit {
                region_id: "IE04".to_string(),
                region_name: "Northern and Western".to_string(),
                country_code: "IE".to_string(),
                geometry: square(0.0),
            },
            RawUnit {
                region_id: "UKM5".to_string(),
                region_name: "North Eastern Scotland".to_string(),
                country_code: "UK".to_string(),
                geometry: square(20.0),
            },
            RawUnit {
                region_id: "IMN".to_string(),
                region_name: "Isle of Man".to_string(),
                country_code: "IMN".to_string(),
                geometry: square(40.0),
            },
        ];
        RegionSet::new(units.into_iter().map(enrich).collect()).unwrap()
    }

    #[test]
    fn country_overrides_and_fallback() {
        assert_eq!(derive_country("IE05", "IE", "Southern"), "Republic of Ireland");
        assert_eq!(derive_country("UKM6", "UK", "Highlands and Islands"), "Scotland");
        assert_eq!(derive_country("UKL", "UK", "Wales"), "Wales");
        assert_eq!(derive_country("GGY", "GGY", "Guernsey"), "Guernsey");
        // No recognizable country in the name: the designated fallback.
        assert_eq!(derive_country("UKC", "UK", "North East"), "England");
    }

    #[test]
    fn high_level_rollup() {
        for home_nation in ["England", "Scotland", "Wales", "Northern Ireland"] {
            assert_eq!(high_level(home_nation), "UK");
        }
        assert_eq!(high_level("Isle of Man"), "Isle of Man");
        assert_eq!(high_level("Republic of Ireland"), "Republic of Ireland");
        assert_eq!(high_level("Guernsey"), "Guernsey");
    }

    #[test]
    fn cache_round_trip_preserves_order_and_attributes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regions").join("region_polygons.geojson");

        let set = sample_set();
        write_cache(&path, &set).unwrap();
        let loaded = load_cache(&path).unwrap();

        assert_eq!(loaded.len(), set.len());
        for (a, b) in set.iter().zip(loaded.iter()) {
            assert_eq!(a.region_id, b.region_id);
            assert_eq!(a.region_name, b.region_name);
            assert_eq!(a.country_code, b.country_code);
            assert_eq!(a.country, b.country);
            assert_eq!(a.country_high_level, b.country_high_level);
            assert_eq!(a.geometry, b.geometry);
        }
    }

    #[test]
    fn assemble_uses_cache_without_touching_sources() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("regions");
        let set = sample_set();
        write_cache(&cache_dir.join("region_polygons.geojson"), &set).unwrap();

        // Sources deliberately point nowhere: a cached run must not read them.
        let config = RegionsConfig {
            cache_dir,
            cache_file: "region_polygons.geojson".to_string(),
            target_crs: "EPSG:27700".to_string(),
            sources: vec![SourceConfig {
                key: "uki".to_string(),
                path: PathBuf::from("/nonexistent/NUTS.shp"),
                crs: "EPSG:3035".to_string(),
                kind: SourceKind::Nuts,
            }],
        };

        let loaded = assemble(&config).unwrap();
        let ids: Vec<&str> = loaded.iter().map(|r| r.region_id.as_str()).collect();
        assert_eq!(ids, vec!["IE04", "UKM5", "IMN"]);
    }

    #[test]
    fn assemble_without_cache_fails_on_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let config = RegionsConfig {
            cache_dir: dir.path().join("regions"),
            cache_file: "region_polygons.geojson".to_string(),
            target_crs: "EPSG:27700".to_string(),
            sources: vec![SourceConfig {
                key: "uki".to_string(),
                path: PathBuf::from("/nonexistent/NUTS.shp"),
                crs: "EPSG:3035".to_string(),
                kind: SourceKind::Nuts,
            }],
        };

        let err = assemble(&config).unwrap_err();
        assert!(matches!(err, PrepError::Configuration(_)), "{err}");
        // Nothing may be cached on failure.
        assert!(!config.cache_path().exists());
    }

    #[test]
    fn enrichment_applied_during_assembly() {
        let set = sample_set();
        let regions: Vec<&Region> = set.iter().collect();
        assert_eq!(regions[0].country, "Republic of Ireland");
        assert_eq!(regions[0].country_high_level, "Republic of Ireland");
        assert_eq!(regions[1].country, "Scotland");
        assert_eq!(regions[1].country_high_level, "UK");
        assert_eq!(regions[2].country, "Isle of Man");
        assert_eq!(regions[2].country_high_level, "Isle of Man");
    }
}
