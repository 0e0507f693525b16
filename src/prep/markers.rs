//! Marker pivoting: delimited multi-value columns to a long relational table.

use hashbrown::HashSet;

use crate::models::{MarkerColumn, MarkerRow, TreeRecord};

const DELIMITER: char = ',';

/// Pivot the marker columns of all records into long-format rows.
///
/// Null and "Unknown" cells are skipped; values are split on the delimiter,
/// trimmed, and deduplicated per (id, column, value). Row order follows
/// column order, then record order.
pub fn marker_table(records: &[TreeRecord]) -> Vec<MarkerRow> {
    let mut rows = Vec::new();
    let mut seen: HashSet<MarkerRow> = HashSet::new();

    for column in MarkerColumn::all() {
        for record in records {
            let raw = match column.value(record) {
                Some(value) => value.trim(),
                None => continue,
            };
            if raw.is_empty() || raw == "Unknown" || raw == "nan" {
                continue;
            }

            for value in raw.split(DELIMITER) {
                let value = value.trim();
                if value.is_empty() {
                    continue;
                }
                let row = MarkerRow {
                    id: record.id.clone(),
                    variable: column.as_str().to_string(),
                    value: value.to_string(),
                };
                if seen.insert(row.clone()) {
                    rows.push(row);
                }
            }
        }
    }

    rows
}
