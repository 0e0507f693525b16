//! Point-to-region classification.
//!
//! Assigns every point to its containing region, falling back to the nearest
//! region by planar distance for points outside all polygons. Ties resolve
//! to the region earliest in assembly order.

mod classifier;
mod index;

pub use classifier::classify;
pub use index::RegionIndex;
