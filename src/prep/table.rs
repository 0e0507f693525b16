//! CSV reading and writing for the inventory tables.

use std::fs::File;
use std::path::Path;

use crate::error::{PrepError, Result};
use crate::models::{BaseRecord, MarkerRow, PointRecord, TreeRecord};

/// Read the raw inventory CSV. Columns beyond the known set are ignored.
pub fn read_records(path: &Path) -> Result<Vec<TreeRecord>> {
    let file = File::open(path).map_err(|e| {
        PrepError::Configuration(format!("input {} unreadable: {e}", path.display()))
    })?;
    let mut reader = csv::Reader::from_reader(file);

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: TreeRecord = result?;
        records.push(record);
    }
    Ok(records)
}

/// Extract the point set for classification.
///
/// Missing coordinates become non-finite values so the classifier rejects
/// the run naming the offending ids, rather than this step silently dropping
/// records.
pub fn points(records: &[TreeRecord]) -> Vec<PointRecord> {
    records
        .iter()
        .map(|record| PointRecord {
            id: record.id.clone(),
            x: record.x.unwrap_or(f64::NAN),
            y: record.y.unwrap_or(f64::NAN),
        })
        .collect()
}

pub fn write_base_table(path: &Path, rows: &[BaseRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|e| PrepError::io(path, e))?;
    Ok(())
}

pub fn write_marker_table(path: &Path, rows: &[MarkerRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|e| PrepError::io(path, e))?;
    Ok(())
}
