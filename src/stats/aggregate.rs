//! Mean and standard error across replicate samples.

use crate::domain::{Cell, Channel};
use crate::series::AlignedColumns;

/// Minimum number of samples for a role to get an aggregate.
pub const MIN_SAMPLES_FOR_SEM: usize = 2;

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator); needs at least 2 values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / (values.len() as f64 - 1.0)).sqrt())
}

/// Standard error of the mean: `stdev / sqrt(n)`.
pub fn standard_error(values: &[f64]) -> Option<f64> {
    let sd = sample_std_dev(values)?;
    Some(sd / (values.len() as f64).sqrt())
}

/// One row of a role's aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub mean: Cell,
    pub sem: Cell,
    /// Samples with a value at this row.
    pub n: usize,
}

/// Per-row mean and SEM of one channel across samples.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleAggregate {
    pub channel: Channel,
    pub samples: usize,
    pub rows: Vec<AggregateRow>,
}

impl RoleAggregate {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn means(&self) -> Vec<Cell> {
        self.rows.iter().map(|r| r.mean).collect()
    }

    pub fn sems(&self) -> Vec<Cell> {
        self.rows.iter().map(|r| r.sem).collect()
    }
}

/// Aggregate aligned columns of one channel.
///
/// Returns `None` when fewer than `MIN_SAMPLES_FOR_SEM` samples contribute;
/// a single sample would only yield a meaningless zero-variance SEM. Rows
/// where only one sample has a value get a mean but no SEM.
pub fn aggregate_role(channel: Channel, aligned: &AlignedColumns) -> Option<RoleAggregate> {
    if aligned.columns.len() < MIN_SAMPLES_FOR_SEM {
        return None;
    }

    let rows = (0..aligned.len)
        .map(|row| {
            let values: Vec<f64> = aligned
                .row(row)
                .into_iter()
                .flatten()
                .filter(|v| v.is_finite())
                .collect();
            AggregateRow {
                mean: mean(&values),
                sem: standard_error(&values),
                n: values.len(),
            }
        })
        .collect();

    Some(RoleAggregate {
        channel,
        samples: aligned.columns.len(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SampleColumn;
    use crate::series::align_columns;

    fn column(sample: u32, values: &[f64]) -> SampleColumn {
        SampleColumn {
            sample,
            cells: values.iter().copied().map(Some).collect(),
        }
    }

    #[test]
    fn sem_matches_hand_computation() {
        // values 2, 4, 6: mean 4, sample sd 2, sem 2/sqrt(3)
        let sem = standard_error(&[2.0, 4.0, 6.0]).unwrap();
        assert!((sem - 2.0 / 3f64.sqrt()).abs() < 1e-12);
        assert!(standard_error(&[1.0]).is_none());
    }

    #[test]
    fn aggregates_each_row() {
        let aligned = align_columns(vec![column(1, &[1.0, 2.0]), column(2, &[3.0, 6.0])]).unwrap();
        let agg = aggregate_role(Channel::Cp, &aligned).unwrap();

        assert_eq!(agg.means(), vec![Some(2.0), Some(4.0)]);
        let sem0 = agg.rows[0].sem.unwrap();
        assert!((sem0 - 1.0).abs() < 1e-12);
        assert_eq!(agg.samples, 2);
    }

    #[test]
    fn single_sample_has_no_aggregate() {
        let aligned = align_columns(vec![column(1, &[1.0, 2.0, 3.0])]).unwrap();
        assert!(aggregate_role(Channel::Long, &aligned).is_none());
    }

    #[test]
    fn three_samples_of_different_length_give_shortest_rows() {
        let a: Vec<f64> = (0..10).map(f64::from).collect();
        let b: Vec<f64> = (0..8).map(f64::from).collect();
        let c: Vec<f64> = (0..9).map(f64::from).collect();
        let aligned = align_columns(vec![column(1, &a), column(2, &b), column(3, &c)]).unwrap();
        let agg = aggregate_role(Channel::Cp, &aligned).unwrap();

        assert_eq!(agg.len(), 8);
        assert!(agg.rows.iter().all(|r| r.n == 3 && r.sem == Some(0.0)));
    }

    #[test]
    fn gap_rows_use_only_contributing_samples() {
        let aligned = AlignedColumns {
            len: 1,
            columns: vec![
                SampleColumn { sample: 1, cells: vec![Some(5.0)] },
                SampleColumn { sample: 2, cells: vec![None] },
            ],
        };
        let agg = aggregate_role(Channel::Lat, &aligned).unwrap();
        assert_eq!(agg.rows[0], AggregateRow { mean: Some(5.0), sem: None, n: 1 });
    }
}
