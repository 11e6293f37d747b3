//! Cross-sample alignment.
//!
//! Per-row mean and SEM across samples are only meaningful when every
//! contributing column covers the same rows, so all columns are cut to the
//! shortest effective length.

use crate::domain::{Cell, SampleColumn, SampleIndex};
use crate::error::{AppError, ErrorKind};

/// Columns truncated to a common length.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedColumns {
    pub len: usize,
    pub columns: Vec<SampleColumn>,
}

impl AlignedColumns {
    pub fn samples(&self) -> Vec<SampleIndex> {
        self.columns.iter().map(|c| c.sample).collect()
    }

    /// Values of every column at `row`.
    pub fn row(&self, row: usize) -> Vec<Cell> {
        self.columns
            .iter()
            .map(|c| c.cells.get(row).copied().flatten())
            .collect()
    }
}

/// Length of a column ignoring trailing missing values.
///
/// Interior gap bins still count: they hold a row position on the shared
/// time grid, so a column is as long as its last present value + 1.
pub fn effective_len(cells: &[Cell]) -> usize {
    cells.iter().rposition(Option::is_some).map_or(0, |last| last + 1)
}

/// Truncate every column to the shortest effective length.
///
/// Columns with no value at all do not take part. Fails with
/// `InsufficientData` when nothing is left to align.
pub fn align_columns(columns: Vec<SampleColumn>) -> Result<AlignedColumns, AppError> {
    let mut kept: Vec<SampleColumn> = columns
        .into_iter()
        .filter(|c| effective_len(&c.cells) > 0)
        .collect();

    let len = kept
        .iter()
        .map(|c| effective_len(&c.cells))
        .min()
        .unwrap_or(0);
    if len == 0 {
        return Err(AppError::new(
            ErrorKind::InsufficientData,
            "No column has any value to align.",
        ));
    }

    for column in &mut kept {
        column.cells.truncate(len);
    }

    Ok(AlignedColumns { len, columns: kept })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(sample: SampleIndex, len: usize) -> SampleColumn {
        SampleColumn {
            sample,
            cells: (0..len).map(|i| Some(i as f64)).collect(),
        }
    }

    #[test]
    fn truncates_to_shortest() {
        let aligned = align_columns(vec![column(1, 10), column(2, 8), column(3, 9)]).unwrap();
        assert_eq!(aligned.len, 8);
        assert!(aligned.columns.iter().all(|c| c.cells.len() == 8));
        assert_eq!(aligned.samples(), vec![1, 2, 3]);
    }

    #[test]
    fn trailing_missing_values_do_not_count() {
        let mut short = column(2, 6);
        short.cells.extend([None, None, None]);
        let aligned = align_columns(vec![column(1, 9), short]).unwrap();
        assert_eq!(aligned.len, 6);
    }

    #[test]
    fn interior_gaps_keep_their_row_position() {
        let cells = vec![Some(1.0), None, None, Some(4.0), None];
        assert_eq!(effective_len(&cells), 4);
        assert_eq!(cells.iter().flatten().count(), 2);
    }

    #[test]
    fn empty_columns_are_left_out() {
        let empty = SampleColumn { sample: 2, cells: vec![None; 4] };
        let aligned = align_columns(vec![column(1, 5), empty]).unwrap();
        assert_eq!(aligned.samples(), vec![1]);
        assert_eq!(aligned.len, 5);
    }

    #[test]
    fn nothing_to_align_is_insufficient_data() {
        let err = align_columns(vec![SampleColumn { sample: 1, cells: vec![None] }]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
        assert!(align_columns(Vec::new()).is_err());
    }
}
