//! Core data models for the preparation pipeline.

pub mod record;
pub mod region;

pub use record::{BaseRecord, MarkerColumn, MarkerRow, TreeRecord};
pub use region::{Assignment, PointRecord, Region, RegionSet};
