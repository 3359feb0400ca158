//! CSV ingest.
//!
//! This module only turns a CSV file into a [`RawTable`]: header names plus
//! string cells. Schema checks and type coercion belong to the normalizer.
//!
//! - records are read `flexible` (ragged rows are padded with empty cells)
//! - cells are trimmed
//! - a record the CSV parser rejects is skipped and reported, not fatal

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use crate::domain::{RawRow, RawTable};
use crate::error::AppError;

/// A record-level CSV error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the table plus any records that could not be parsed.
#[derive(Debug, Clone)]
pub struct IngestedTable {
    pub table: RawTable,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load a CSV file into a [`RawTable`].
pub fn read_table(path: &Path) -> Result<IngestedTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let ingested = read_table_from(file)?;
    debug!(
        path = %path.display(),
        rows = ingested.table.len(),
        columns = ingested.table.headers.len(),
        "loaded CSV"
    );
    Ok(ingested)
}

/// Load CSV data from any reader.
pub fn read_table_from<R: Read>(reader: R) -> Result<IngestedTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(AppError::new(2, "CSV has no header row."));
    }

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        rows_read += 1;
        let fallback_line = idx + 2;
        match result {
            Ok(record) => {
                // Multi-line quoted fields shift line numbers; prefer the
                // parser's own position when it has one.
                let line = record
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(fallback_line);
                let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
                if cells.len() < headers.len() {
                    cells.resize(headers.len(), String::new());
                }
                rows.push(RawRow { line, record: idx, cells });
            }
            Err(e) => row_errors.push(RowError {
                line: e.position().map(|p| p.line() as usize).unwrap_or(fallback_line),
                message: e.to_string(),
            }),
        }
    }

    if !row_errors.is_empty() {
        warn!(errors = row_errors.len(), "skipped unparseable CSV records");
    }

    Ok(IngestedTable {
        table: RawTable { headers, rows },
        row_errors,
        rows_read,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_headers_and_trimmed_cells() {
        let csv = "id, derived_race ,derived_sex\n1, White , Male\n2,Asian,Female\n";
        let out = read_table_from(csv.as_bytes()).unwrap();
        assert_eq!(out.table.headers, vec!["id", "derived_race", "derived_sex"]);
        assert_eq!(out.table.rows.len(), 2);
        assert_eq!(out.table.rows[0].cells, vec!["1", "White", "Male"]);
        assert_eq!(out.table.rows[0].line, 2);
        assert_eq!(out.table.rows[1].line, 3);
        assert_eq!(out.rows_read, 2);
    }

    #[test]
    fn pads_short_rows() {
        let csv = "a,b,c\n1,2\n";
        let out = read_table_from(csv.as_bytes()).unwrap();
        assert_eq!(out.table.rows[0].cells, vec!["1", "2", ""]);
    }

    #[test]
    fn unparseable_record_is_reported_once_and_keeps_its_slot() {
        let csv = b"race,sex\nWhite,Male\nWh\xffite,Male\nAsian,Female\n";
        let out = read_table_from(&csv[..]).unwrap();

        assert_eq!(out.rows_read, 3);
        assert_eq!(out.row_errors.len(), 1);
        assert_eq!(out.row_errors[0].line, 3);
        assert_eq!(out.row_errors[0].message.matches("CSV parse error").count(), 1);

        let records: Vec<usize> = out.table.rows.iter().map(|r| r.record).collect();
        assert_eq!(records, vec![0, 2]);
    }

    #[test]
    fn empty_input_has_no_header() {
        let err = read_table_from("".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn missing_file_is_exit_code_2() {
        let err = read_table(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("here.csv"));
    }
}
