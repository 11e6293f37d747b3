//! CSV ingest.
//!
//! Reads the exported measurement sheet into a column-major `RawTable`.
//!
//! Design goals:
//! - **No schema knowledge here**: column roles are resolved by the classifier
//! - **Cell-level validation** (bad cells become missing, but are reported)
//! - **Deterministic behavior** (header order is preserved)

use std::fs::File;
use std::io::{ErrorKind as IoErrorKind, Read};
use std::path::Path;

use log::warn;

use crate::domain::{Cell, RawColumn, RawTable};
use crate::error::{AppError, ErrorKind};

/// A cell that held text which is not a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellIssue {
    /// 1-based line in the file (the header is line 1).
    pub line: usize,
    pub column: String,
    pub value: String,
}

/// Ingest output: the sheet plus what could not be parsed.
#[derive(Debug, Clone)]
pub struct IngestedTable {
    pub table: RawTable,
    pub cell_issues: Vec<CellIssue>,
    pub rows_read: usize,
}

/// Open and read a CSV sheet.
pub fn load_table(path: &Path) -> Result<IngestedTable, AppError> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == IoErrorKind::NotFound {
            AppError::new(
                ErrorKind::InputNotFound,
                format!("Input file '{}' does not exist.", path.display()),
            )
        } else {
            AppError::new(
                ErrorKind::Io,
                format!("Failed to open input '{}': {e}", path.display()),
            )
        }
    })?;
    read_table(file)
}

/// Read a CSV sheet from any reader.
pub fn read_table<R: Read>(reader: R) -> Result<IngestedTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .byte_headers()
        .map_err(|e| AppError::new(ErrorKind::Schema, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let mut columns: Vec<RawColumn> = headers
        .iter()
        .map(|name| RawColumn {
            name: normalize_header_name(&String::from_utf8_lossy(name)),
            cells: Vec::new(),
        })
        .collect();

    let mut cell_issues = Vec::new();
    let mut rows_read = 0usize;

    // Byte records: a stray non-UTF-8 byte only spoils its own cell.
    for (idx, result) in reader.byte_records().enumerate() {
        // +2: records start after the header, lines are 1-based
        let line = idx + 2;
        let record = result
            .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to read CSV line {line}: {e}")))?;
        rows_read += 1;

        for (col_idx, column) in columns.iter_mut().enumerate() {
            let raw = String::from_utf8_lossy(record.get(col_idx).unwrap_or_default());
            let cell = match parse_cell(&raw) {
                Ok(cell) => cell,
                Err(()) => {
                    cell_issues.push(CellIssue {
                        line,
                        column: column.name.clone(),
                        value: raw.into_owned(),
                    });
                    None
                }
            };
            column.cells.push(cell);
        }
    }

    for issue in &cell_issues {
        warn!(
            "line {}, column `{}`: non-numeric value '{}' treated as missing",
            issue.line, issue.column, issue.value
        );
    }

    Ok(IngestedTable {
        table: RawTable { columns },
        cell_issues,
        rows_read,
    })
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often put a BOM in front of the first header.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

/// Empty cells and `NaN` placeholders are missing; anything else must parse.
fn parse_cell(raw: &str) -> Result<Cell, ()> {
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(()),
    }
}
