//! Spatial index over region envelopes.

use geo::BoundingRect;
use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

use crate::models::RegionSet;

/// R-tree entry: a region's bounding box plus its assembly ordinal.
///
/// The exact containment test stays with the caller; the index only prunes
/// candidates by envelope intersection.
struct IndexedEnvelope {
    ordinal: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Spatial index for region candidate lookup.
pub struct RegionIndex {
    tree: RTree<IndexedEnvelope>,
}

impl RegionIndex {
    /// Build the index from an assembled region set.
    pub fn build(regions: &RegionSet) -> Self {
        let indexed: Vec<IndexedEnvelope> = regions
            .iter()
            .enumerate()
            .filter_map(|(ordinal, region)| {
                region.geometry.bounding_rect().map(|rect| IndexedEnvelope {
                    ordinal,
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                })
            })
            .collect();

        let tree = RTree::bulk_load(indexed);
        info!("Spatial index built with {} regions", tree.size());

        Self { tree }
    }

    /// Assembly ordinals of regions whose envelope contains the point, in no
    /// particular order.
    pub fn candidates(&self, x: f64, y: f64) -> impl Iterator<Item = usize> + '_ {
        self.tree
            .locate_in_envelope_intersecting(&AABB::from_point([x, y]))
            .map(|entry| entry.ordinal)
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
