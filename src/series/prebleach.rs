//! Prebleach stripping.
//!
//! The first `PREBLEACH_ROWS` rows of every sample are acquired before the
//! bleach. They only contribute a per-channel baseline; everything downstream
//! works on the postbleach rows with time measured from the first of them.

use std::collections::BTreeMap;

use crate::domain::{Cell, PostbleachSeries, PrebleachBaseline, Sample};
use crate::error::{AppError, ErrorKind};
use crate::stats::mean;

/// Number of prebleach rows at the top of every sample.
pub const PREBLEACH_ROWS: usize = 3;

/// Result of splitting a sample at the bleach.
#[derive(Debug, Clone, PartialEq)]
pub struct StrippedSample {
    pub baseline: PrebleachBaseline,
    pub postbleach: PostbleachSeries,
}

/// Split a sample into its prebleach baseline and re-zeroed postbleach rows.
pub fn strip_prebleach(sample: &Sample) -> Result<StrippedSample, AppError> {
    if sample.len() <= PREBLEACH_ROWS {
        return Err(AppError::new(
            ErrorKind::InsufficientData,
            format!(
                "Sample {}: {} row(s), need at least {} ({} prebleach + 1 postbleach).",
                sample.index,
                sample.len(),
                PREBLEACH_ROWS + 1,
                PREBLEACH_ROWS
            ),
        ));
    }

    let t0 = sample.time[PREBLEACH_ROWS]
        .filter(|t| t.is_finite())
        .ok_or_else(|| {
            AppError::new(
                ErrorKind::MalformedValue,
                format!(
                    "Sample {}: first postbleach time (row {}) is missing or not numeric.",
                    sample.index,
                    PREBLEACH_ROWS + 1
                ),
            )
        })?;

    let baseline = PrebleachBaseline {
        channels: sample
            .channels
            .iter()
            .filter_map(|(&channel, cells)| {
                let present: Vec<f64> = cells.iter().take(PREBLEACH_ROWS).flatten().copied().collect();
                mean(&present).map(|m| (channel, m))
            })
            .collect(),
    };

    let time: Vec<Cell> = sample.time[PREBLEACH_ROWS..]
        .iter()
        .map(|t| t.map(|t| t - t0))
        .collect();

    let channels: BTreeMap<_, _> = sample
        .channels
        .iter()
        .map(|(&channel, cells)| (channel, cells.iter().skip(PREBLEACH_ROWS).copied().collect()))
        .collect();

    Ok(StrippedSample {
        baseline,
        postbleach: PostbleachSeries {
            sample: sample.index,
            time,
            channels,
        },
    })
}
