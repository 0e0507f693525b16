//! Loading and normalizing individual geometry sources.
//!
//! Each configured source is a shapefile or GeoJSON file with its own CRS
//! and its own attribute naming. Loading filters the features to the units
//! relevant to the target area, unifies the schema to the common region
//! field set, and reprojects the geometry into British National Grid.

use geo_types::{Geometry, MultiPolygon};
use std::fs::File;
use std::io::BufReader;
use tracing::info;

use crate::config::{SourceConfig, SourceKind};
use crate::crs::{self, Crs};
use crate::error::{PrepError, Result};

/// A schema-normalized unit from one source, before country enrichment.
#[derive(Debug, Clone)]
pub struct RawUnit {
    pub region_id: String,
    pub region_name: String,
    pub country_code: String,
    pub geometry: MultiPolygon<f64>,
}

/// Load one source and return its selected units in file order, reprojected
/// into British National Grid.
pub fn load_source(source: &SourceConfig) -> Result<Vec<RawUnit>> {
    let source_crs = Crs::parse(&source.crs)?;

    let extension = source
        .path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    let mut units = match extension.as_str() {
        "shp" => load_shapefile(source)?,
        "geojson" | "json" => load_geojson(source)?,
        other => {
            return Err(PrepError::Configuration(format!(
                "source '{}': unsupported geometry format '{other}' ({})",
                source.key,
                source.path.display()
            )))
        }
    };

    if source_crs != Crs::BritishNationalGrid {
        for unit in &mut units {
            unit.geometry = crs::reproject(&unit.geometry, source_crs);
        }
    }

    info!(
        "Source '{}': {} units selected from {}",
        source.key,
        units.len(),
        source.path.display()
    );

    Ok(units)
}

/// The selection predicate for NUTS statistical-unit exports: level-2 units
/// for Ireland or Scotland (ids carrying the `UKM` prefix), plus level-1 UK
/// units excluding the Scotland aggregate itself.
pub(crate) fn nuts_selected(id: &str, country_code: &str, level: i64) -> bool {
    ((country_code == "IE" || id.contains("UKM")) && level == 2)
        || (country_code == "UK" && level == 1 && id != "UKM")
}

/// Attribute access over the two feature encodings.
enum Attrs<'a> {
    Dbase(&'a shapefile::dbase::Record),
    Json(&'a geojson::JsonObject),
}

impl Attrs<'_> {
    fn string(&self, field: &str) -> Option<String> {
        match self {
            Attrs::Dbase(record) => match record.get(field) {
                Some(shapefile::dbase::FieldValue::Character(Some(s))) => Some(s.clone()),
                _ => None,
            },
            Attrs::Json(props) => props.get(field).and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            }),
        }
    }

    fn integer(&self, field: &str) -> Option<i64> {
        match self {
            Attrs::Dbase(record) => match record.get(field) {
                Some(shapefile::dbase::FieldValue::Numeric(Some(n))) => Some(*n as i64),
                Some(shapefile::dbase::FieldValue::Integer(n)) => Some(i64::from(*n)),
                Some(shapefile::dbase::FieldValue::Double(n)) => Some(*n as i64),
                Some(shapefile::dbase::FieldValue::Character(Some(s))) => s.trim().parse().ok(),
                _ => None,
            },
            Attrs::Json(props) => props.get(field).and_then(|v| match v {
                serde_json::Value::Number(n) => n.as_i64(),
                serde_json::Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }),
        }
    }
}

/// Apply the source's selection predicate and schema normalization to one
/// feature. Returns `None` for features the predicate excludes.
fn normalize(
    source: &SourceConfig,
    attrs: &Attrs<'_>,
    geometry: MultiPolygon<f64>,
) -> Result<Option<RawUnit>> {
    match &source.kind {
        SourceKind::Nuts => {
            let id = required(source, attrs, "NUTS_ID")?;
            let country_code = required(source, attrs, "CNTR_CODE")?;
            let name = required(source, attrs, "NUTS_NAME")?;
            let level = attrs.integer("LEVL_CODE").ok_or_else(|| {
                PrepError::schema(&source.key, "missing or non-numeric attribute 'LEVL_CODE'")
            })?;

            if !nuts_selected(&id, &country_code, level) {
                return Ok(None);
            }
            Ok(Some(RawUnit {
                region_id: id,
                region_name: name,
                country_code,
                geometry,
            }))
        }
        SourceKind::Admin0 {
            id_field,
            name_field,
        } => {
            let id = required(source, attrs, id_field)?;
            let name = required(source, attrs, name_field)?;
            // Single-country sources carry no separate country code; the
            // unit id doubles as one.
            Ok(Some(RawUnit {
                region_id: id.clone(),
                region_name: name,
                country_code: id,
                geometry,
            }))
        }
    }
}

fn required(source: &SourceConfig, attrs: &Attrs<'_>, field: &str) -> Result<String> {
    attrs
        .string(field)
        .ok_or_else(|| PrepError::schema(&source.key, format!("missing attribute '{field}'")))
}

fn load_shapefile(source: &SourceConfig) -> Result<Vec<RawUnit>> {
    let mut reader = shapefile::Reader::from_path(&source.path).map_err(|e| {
        PrepError::Configuration(format!(
            "source '{}' unreadable at {}: {e}",
            source.key,
            source.path.display()
        ))
    })?;

    let mut units = Vec::new();

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;

        let geometry: MultiPolygon<f64> = match shape {
            shapefile::Shape::Polygon(polygon) => polygon
                .try_into()
                .map_err(|e| PrepError::schema(&source.key, format!("bad polygon: {e:?}")))?,
            shapefile::Shape::PolygonM(polygon) => polygon
                .try_into()
                .map_err(|e| PrepError::schema(&source.key, format!("bad polygon: {e:?}")))?,
            shapefile::Shape::PolygonZ(polygon) => polygon
                .try_into()
                .map_err(|e| PrepError::schema(&source.key, format!("bad polygon: {e:?}")))?,
            // Non-polygon shapes cannot be region boundaries.
            _ => continue,
        };

        if let Some(unit) = normalize(source, &Attrs::Dbase(&record), geometry)? {
            units.push(unit);
        }
    }

    Ok(units)
}

fn load_geojson(source: &SourceConfig) -> Result<Vec<RawUnit>> {
    let file = File::open(&source.path).map_err(|e| {
        PrepError::Configuration(format!(
            "source '{}' unreadable at {}: {e}",
            source.key,
            source.path.display()
        ))
    })?;

    let geojson =
        geojson::GeoJson::from_reader(BufReader::new(file)).map_err(geojson::Error::from)?;
    let collection = match geojson {
        geojson::GeoJson::FeatureCollection(fc) => fc,
        _ => {
            return Err(PrepError::schema(
                &source.key,
                "expected a GeoJSON FeatureCollection",
            ))
        }
    };

    let mut units = Vec::new();
    let empty = geojson::JsonObject::new();

    for feature in collection.features {
        let geometry = match feature.geometry {
            Some(geometry) => {
                let converted: Geometry<f64> = geometry.value.try_into()?;
                match converted {
                    Geometry::MultiPolygon(mp) => mp,
                    Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => continue,
                }
            }
            None => continue,
        };

        let props = feature.properties.as_ref().unwrap_or(&empty);
        if let Some(unit) = normalize(source, &Attrs::Json(props), geometry)? {
            units.push(unit);
        }
    }

    Ok(units)
}
