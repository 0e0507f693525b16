//! Region polygons and classification result types.

use geo::MultiPolygon;
use hashbrown::HashMap;

use crate::error::{PrepError, Result};

/// A named administrative region polygon with enrichment attributes.
///
/// All regions in a [`RegionSet`] share one planar coordinate reference
/// system; geometry is read-only after assembly.
#[derive(Debug, Clone)]
pub struct Region {
    /// Unique region identifier (e.g., a NUTS id or ISO code).
    pub region_id: String,
    /// Human-readable region name.
    pub region_name: String,
    /// Source country code for the unit.
    pub country_code: String,
    /// Country derived from the region name (with source-specific overrides).
    pub country: String,
    /// Country rolled up to the umbrella value where applicable.
    pub country_high_level: String,
    /// Polygon geometry in the target planar CRS.
    pub geometry: MultiPolygon<f64>,
}

/// The assembled region set, in a fixed assembly order.
///
/// The order regions were assembled in is the iteration order used for the
/// classifier's first-match and distance tie-breaks, so it is preserved
/// exactly (including through the on-disk cache).
#[derive(Debug, Clone, Default)]
pub struct RegionSet {
    regions: Vec<Region>,
}

impl RegionSet {
    /// Build a region set, enforcing `region_id` uniqueness.
    pub fn new(regions: Vec<Region>) -> Result<Self> {
        let mut seen: HashMap<&str, usize> = HashMap::with_capacity(regions.len());
        for (i, region) in regions.iter().enumerate() {
            if let Some(first) = seen.insert(region.region_id.as_str(), i) {
                return Err(PrepError::Configuration(format!(
                    "duplicate region_id '{}' (positions {} and {})",
                    region.region_id, first, i
                )));
            }
        }
        drop(seen);
        Ok(Self { regions })
    }

    /// Regions in fixed assembly order.
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn get(&self, ordinal: usize) -> Option<&Region> {
        self.regions.get(ordinal)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// One point to classify, in the same planar CRS as the region geometry.
#[derive(Debug, Clone)]
pub struct PointRecord {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// Denormalized region attributes assigned to a point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub region_id: String,
    pub region_name: String,
    pub country_code: String,
    pub country: String,
    pub country_high_level: String,
}

impl Assignment {
    pub fn from_region(region: &Region) -> Self {
        Self {
            region_id: region.region_id.clone(),
            region_name: region.region_name.clone(),
            country_code: region.country_code.clone(),
            country: region.country.clone(),
            country_high_level: region.country_high_level.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    fn square(origin: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: origin, y: 0.0),
            (x: origin + 10.0, y: 0.0),
            (x: origin + 10.0, y: 10.0),
            (x: origin, y: 10.0),
        ]])
    }

    fn region(id: &str) -> Region {
        Region {
            region_id: id.to_string(),
            region_name: id.to_string(),
            country_code: "UK".to_string(),
            country: "England".to_string(),
            country_high_level: "UK".to_string(),
            geometry: square(0.0),
        }
    }

    #[test]
    fn duplicate_region_id_rejected() {
        let err = RegionSet::new(vec![region("A"), region("A")]).unwrap_err();
        assert!(err.to_string().contains("duplicate region_id 'A'"));
    }

    #[test]
    fn assembly_order_preserved() {
        let set = RegionSet::new(vec![region("B"), region("A")]).unwrap();
        let ids: Vec<&str> = set.iter().map(|r| r.region_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
    }
}
