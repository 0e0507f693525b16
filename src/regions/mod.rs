//! Region polygon assembly.
//!
//! Builds the canonical set of named region polygons from heterogeneous
//! vector sources, reprojects them into the target grid, enriches them with
//! country attributes, and caches the combined set to disk.

mod assemble;
mod sources;

pub use assemble::{assemble, load_cache, write_cache};
pub use sources::{load_source, RawUnit};
