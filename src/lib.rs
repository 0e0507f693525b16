//! Treebase - preparation pipeline for ancient tree inventory records.
//!
//! Cleans a raw tabular tree inventory into a base table and a long-format
//! marker table, assigning each record to an administrative region by
//! polygon containment with a nearest-region fallback.

pub mod classify;
pub mod config;
pub mod crs;
pub mod error;
pub mod models;
pub mod prep;
pub mod regions;

pub use error::PrepError;
pub use models::{Assignment, PointRecord, Region, RegionSet};
