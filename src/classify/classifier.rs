//! The two-phase point classifier.

use geo::{Distance, Euclidean, Intersects, MultiPolygon, Point};
use hashbrown::{HashMap, HashSet};
use tracing::{debug, info};

use super::index::RegionIndex;
use crate::error::{PrepError, Result};
use crate::models::{Assignment, PointRecord, RegionSet};

/// Assign every point to exactly one region.
///
/// Phase 1 assigns each point to the containing region; boundary points
/// count as contained, and among multiple containing regions the one
/// earliest in assembly order wins. Phase 2 assigns each remaining point
/// (boundary/coastline artifacts outside every polygon) to the region with
/// minimum planar distance; exact ties resolve to the earliest region.
///
/// The result covers exactly the input id set, one assignment per point.
/// Points with missing or non-finite coordinates reject the whole run with
/// an error naming every offending id — they are never silently dropped.
pub fn classify(
    points: &[PointRecord],
    regions: &RegionSet,
) -> Result<HashMap<String, Assignment>> {
    if regions.is_empty() {
        return Err(PrepError::Configuration(
            "cannot classify against an empty region set".to_string(),
        ));
    }

    let mut invalid: Vec<String> = points
        .iter()
        .filter(|p| !p.x.is_finite() || !p.y.is_finite())
        .map(|p| p.id.clone())
        .collect();
    if !invalid.is_empty() {
        invalid.sort();
        return Err(PrepError::Data { ids: invalid });
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(points.len());
    for point in points {
        if !seen.insert(point.id.as_str()) {
            return Err(PrepError::Configuration(format!(
                "duplicate point id '{}'",
                point.id
            )));
        }
    }

    let index = RegionIndex::build(regions);
    let mut assignments: HashMap<String, Assignment> = HashMap::with_capacity(points.len());
    let mut unmatched: Vec<&PointRecord> = Vec::new();

    // Phase 1: containment. The index prunes by envelope; the exact test is
    // closed containment, and min-by-ordinal realizes first-match-wins over
    // the fixed assembly order without depending on evaluation order.
    for point in points {
        let location = Point::new(point.x, point.y);
        let winner = index
            .candidates(point.x, point.y)
            .filter_map(|ordinal| regions.get(ordinal).map(|region| (ordinal, region)))
            .filter(|(_, region)| region.geometry.intersects(&location))
            .min_by_key(|(ordinal, _)| *ordinal);

        match winner {
            Some((_, region)) => {
                assignments.insert(point.id.clone(), Assignment::from_region(region));
            }
            None => unmatched.push(point),
        }
    }

    debug!(
        "Containment phase assigned {} of {} points",
        assignments.len(),
        points.len()
    );

    // Phase 2: nearest fallback. Strict `<` keeps the earliest region on
    // exact distance ties (stable argmin).
    for point in &unmatched {
        let location = Point::new(point.x, point.y);
        let mut best: Option<(usize, f64)> = None;
        for (ordinal, region) in regions.iter().enumerate() {
            let distance = distance_to(&location, &region.geometry);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((ordinal, distance));
            }
        }
        if let Some(region) = best.and_then(|(ordinal, _)| regions.get(ordinal)) {
            assignments.insert(point.id.clone(), Assignment::from_region(region));
        }
    }

    info!(
        "Classified {} points ({} by nearest-region fallback)",
        assignments.len(),
        unmatched.len()
    );

    Ok(assignments)
}

/// Planar distance from a point to polygon geometry; zero when contained.
fn distance_to(point: &Point<f64>, geometry: &MultiPolygon<f64>) -> f64 {
    if geometry.intersects(point) {
        return 0.0;
    }
    geometry
        .iter()
        .map(|polygon| Euclidean.distance(point, polygon))
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Region;
    use geo::polygon;

    fn square_region(id: &str, min_x: f64, max_x: f64) -> Region {
        Region {
            region_id: id.to_string(),
            region_name: format!("Region {id}"),
            country_code: "UK".to_string(),
            country: "England".to_string(),
            country_high_level: "UK".to_string(),
            geometry: MultiPolygon::new(vec![polygon![
                (x: min_x, y: 0.0),
                (x: max_x, y: 0.0),
                (x: max_x, y: 10.0),
                (x: min_x, y: 10.0),
            ]]),
        }
    }

    /// Three adjacent squares A [0,10], B [10,20], C [20,30].
    fn three_squares() -> RegionSet {
        RegionSet::new(vec![
            square_region("A", 0.0, 10.0),
            square_region("B", 10.0, 20.0),
            square_region("C", 20.0, 30.0),
        ])
        .unwrap()
    }

    fn point(id: &str, x: f64, y: f64) -> PointRecord {
        PointRecord {
            id: id.to_string(),
            x,
            y,
        }
    }

    #[test]
    fn interior_point_gets_containing_region() {
        let regions = three_squares();
        let result = classify(&[point("t1", 5.0, 5.0)], &regions).unwrap();
        assert_eq!(result["t1"].region_id, "A");
        assert_eq!(result["t1"].region_name, "Region A");
    }

    #[test]
    fn shared_boundary_resolves_to_first_in_assembly_order() {
        let regions = three_squares();
        // (10, 5) sits on the A/B edge; closed containment matches both,
        // and A is earlier in assembly order.
        let result = classify(&[point("t1", 10.0, 5.0)], &regions).unwrap();
        assert_eq!(result["t1"].region_id, "A");
    }

    #[test]
    fn outside_point_gets_nearest_region() {
        let regions = three_squares();
        let result = classify(&[point("t1", 35.0, 5.0)], &regions).unwrap();
        assert_eq!(result["t1"].region_id, "C");
    }

    #[test]
    fn exact_distance_tie_resolves_to_first_in_assembly_order() {
        // Symmetric fixture: (15, 5) is exactly 5 units from both squares.
        let regions = RegionSet::new(vec![
            square_region("A", 0.0, 10.0),
            square_region("B", 20.0, 30.0),
        ])
        .unwrap();
        let result = classify(&[point("t1", 15.0, 5.0)], &regions).unwrap();
        assert_eq!(result["t1"].region_id, "A");
    }

    #[test]
    fn overlapping_regions_resolve_to_first_in_assembly_order() {
        // A proper partition is expected but not guaranteed by the inputs.
        let regions = RegionSet::new(vec![
            square_region("A", 0.0, 10.0),
            square_region("B", 5.0, 15.0),
        ])
        .unwrap();
        let result = classify(&[point("t1", 7.0, 5.0)], &regions).unwrap();
        assert_eq!(result["t1"].region_id, "A");
    }

    #[test]
    fn output_covers_exactly_the_input_id_set() {
        let regions = three_squares();
        let points = vec![
            point("t1", 5.0, 5.0),
            point("t2", 10.0, 5.0),
            point("t3", 35.0, 5.0),
            point("t4", -100.0, 200.0),
        ];
        let result = classify(&points, &regions).unwrap();
        assert_eq!(result.len(), points.len());
        for p in &points {
            assert!(result.contains_key(&p.id));
        }
    }

    #[test]
    fn classification_is_idempotent() {
        let regions = three_squares();
        let points = vec![
            point("t1", 5.0, 5.0),
            point("t2", 10.0, 5.0),
            point("t3", 35.0, 5.0),
        ];
        let first = classify(&points, &regions).unwrap();
        let second = classify(&points, &regions).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn non_finite_coordinates_reject_the_run_with_ids() {
        let regions = three_squares();
        let points = vec![
            point("good", 5.0, 5.0),
            point("bad-nan", f64::NAN, 5.0),
            point("bad-inf", 5.0, f64::INFINITY),
        ];
        let err = classify(&points, &regions).unwrap_err();
        match err {
            PrepError::Data { ids } => assert_eq!(ids, vec!["bad-inf", "bad-nan"]),
            other => panic!("expected data error, got {other}"),
        }
    }

    #[test]
    fn empty_region_set_is_rejected() {
        let regions = RegionSet::new(vec![]).unwrap();
        let err = classify(&[point("t1", 5.0, 5.0)], &regions).unwrap_err();
        assert!(matches!(err, PrepError::Configuration(_)));
    }

    #[test]
    fn duplicate_point_ids_are_rejected() {
        let regions = three_squares();
        let points = vec![point("t1", 5.0, 5.0), point("t1", 6.0, 5.0)];
        let err = classify(&points, &regions).unwrap_err();
        assert!(err.to_string().contains("duplicate point id"));
    }

    #[test]
    fn denormalized_attributes_follow_the_region() {
        let mut region = square_region("IE04", 0.0, 10.0);
        region.country = "Republic of Ireland".to_string();
        region.country_high_level = "Republic of Ireland".to_string();
        region.country_code = "IE".to_string();
        let regions = RegionSet::new(vec![region]).unwrap();

        let result = classify(&[point("t1", 5.0, 5.0)], &regions).unwrap();
        let assignment = &result["t1"];
        assert_eq!(assignment.country, "Republic of Ireland");
        assert_eq!(assignment.country_high_level, "Republic of Ireland");
        assert_eq!(assignment.country_code, "IE");
    }
}
