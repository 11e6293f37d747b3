//! Write output sheets to CSV.
//!
//! Output files are never overwritten: an existing destination is reported
//! as `OutputCollision` and left untouched.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};

use log::warn;

use crate::domain::{Cell, OutputTable};
use crate::error::{AppError, ErrorKind};

/// Turn a user-supplied base name into an output path with a `.csv` extension.
pub fn output_path(name: &str) -> PathBuf {
    let name = name.trim();
    let path = PathBuf::from(name);
    let has_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        == Some(true);
    if has_csv {
        path
    } else {
        PathBuf::from(format!("{name}.csv"))
    }
}

/// Create `path` for writing, refusing to replace an existing file.
pub fn create_new_file(path: &Path) -> Result<File, AppError> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| {
            if e.kind() == IoErrorKind::AlreadyExists {
                AppError::new(
                    ErrorKind::OutputCollision,
                    format!("File '{}' already exists; not overwriting it.", path.display()),
                )
            } else {
                AppError::new(
                    ErrorKind::Io,
                    format!("Failed to create '{}': {e}", path.display()),
                )
            }
        })
}

/// Create `path` and fill it with `write`.
///
/// A file left half-written by a failing `write` is removed again.
pub fn write_new_file<F, E>(path: &Path, write: F) -> Result<(), AppError>
where
    F: FnOnce(File) -> Result<(), E>,
    E: std::fmt::Display,
{
    let file = create_new_file(path)?;
    write(file).map_err(|e| {
        if let Err(rm) = fs::remove_file(path) {
            warn!("could not remove partial output '{}': {rm}", path.display());
        }
        AppError::new(ErrorKind::Io, format!("Failed to write '{}': {e}", path.display()))
    })
}

/// Write a table as CSV to a new file.
pub fn write_table_csv(path: &Path, table: &OutputTable) -> Result<(), AppError> {
    write_new_file(path, |file| write_table(file, table))
}

/// Write a table as CSV to any writer. Short columns are padded with empty cells.
pub fn write_table<W: Write>(writer: W, table: &OutputTable) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new().flexible(false).from_writer(writer);

    writer.write_record(table.columns.iter().map(|c| c.header.as_str()))?;

    for row in 0..table.row_count() {
        writer.write_record(
            table
                .columns
                .iter()
                .map(|c| fmt_cell(c.cells.get(row).copied().flatten())),
        )?;
    }

    writer.flush()?;
    Ok(())
}

fn fmt_cell(cell: Cell) -> String {
    cell.map(|v| v.to_string()).unwrap_or_default()
}
