//! Peripheral row-wise table transforms: CSV I/O, attribute normalization,
//! date reformatting and marker pivoting.
//!
//! Everything here is a pure function from an immutable input record to a
//! small output record, applied independently per record — no shared mutable
//! state and no ordering requirements.

pub mod dates;
pub mod markers;
pub mod normalize;
pub mod table;

pub use markers::marker_table;
pub use normalize::build_base_record;
pub use table::{points, read_records, write_base_table, write_marker_table};
