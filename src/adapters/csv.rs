use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::domain::model::{RawInvalidRow, RawRangeRow};
use crate::utils::error::Result;

/// Reads the range sheet exported to CSV. Column order follows the legacy
/// spreadsheet: Row, Reference Number, Description, Start Serial,
/// End Serial, Date. Blank cells come through as `None`; the pipeline
/// decides what defaults and what is an error.
pub fn read_range_rows<P: AsRef<Path>>(path: P) -> Result<Vec<RawRangeRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        match record {
            Ok(record) => rows.push(range_row_from_record(&record, index)),
            Err(e) => {
                tracing::warn!("skipping unreadable range record {}: {e}", index + 2);
            }
        }
    }
    Ok(rows)
}

/// Reads the invalid-serial sheet exported to CSV: a single column of
/// serials.
pub fn read_invalid_rows<P: AsRef<Path>>(path: P) -> Result<Vec<RawInvalidRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        match record {
            Ok(record) => rows.push(RawInvalidRow {
                failed_serial: cell(&record, 0).unwrap_or_default(),
            }),
            Err(e) => {
                tracing::warn!("skipping unreadable invalid record {}: {e}", index + 2);
            }
        }
    }
    Ok(rows)
}

fn cell(record: &StringRecord, index: usize) -> Option<String> {
    record
        .get(index)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn range_row_from_record(record: &StringRecord, index: usize) -> RawRangeRow {
    // A missing or non-numeric Row cell falls back to the record ordinal.
    let row = cell(record, 0)
        .and_then(|value| value.parse().ok())
        .unwrap_or((index + 1) as i64);
    RawRangeRow {
        row,
        reference: cell(record, 1),
        description: cell(record, 2),
        start_serial: cell(record, 3).unwrap_or_default(),
        end_serial: cell(record, 4).unwrap_or_default(),
        date: cell(record, 5),
    }
}
