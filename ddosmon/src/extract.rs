//! Latest-row extraction from append-only result files
//!
//! Result files are CSV tables the detection process writes incrementally:
//! a header row followed by data rows, each newline-terminated. A file may
//! be mid-write at the moment it is read, so everything after the last
//! newline is an unfinished row and is never trusted.

use crate::error::{Error, Result};

/// Read `column` from the last fully-written data row of `raw`.
///
/// Returns `Ok(None)` when the input has no complete data rows yet (or not
/// even a complete header); the caller is expected to try again on a later
/// notification for the same file. A complete header that lacks `column`
/// is a non-retryable [`Error::ColumnMissing`].
pub fn latest_value(raw: &[u8], column: &str) -> Result<Option<f64>> {
    // Everything after the last newline is an unfinished row.
    let complete = match raw.iter().rposition(|&b| b == b'\n') {
        Some(idx) => &raw[..=idx],
        None => return Ok(None),
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(complete);

    let headers = reader.headers()?;
    let col_idx = headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| Error::ColumnMissing(column.to_string()))?;

    // Later rows supersede earlier ones; rows too short to carry the
    // score column leave the previous value in place.
    let mut latest: Option<String> = None;
    for record in reader.records() {
        let record = record?;
        if let Some(field) = record.get(col_idx) {
            latest = Some(field.to_string());
        }
    }

    match latest {
        Some(field) => field
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| Error::InvalidScore(field)),
        None => Ok(None),
    }
}
