//! Time resampling onto a regular grid.
//!
//! Samples are acquired at slightly different (and not always regular)
//! intervals, so replicate curves cannot be averaged row by row. Each
//! postbleach row is assigned to the bin `[k * pace, (k + 1) * pace)` that
//! contains its zeroed time, and every bin's value is the arithmetic mean of
//! all rows in it, per channel.
//!
//! The output is dense: it has one bin for every `k` from 0 up to the last
//! populated bin. A bin that received no row is kept as a gap whose values
//! are all missing. Gaps are never zero-filled or interpolated, so
//! downstream statistics simply see no contribution there.
//!
//! Rows that cannot be placed on the grid (missing/non-finite time, negative
//! time after zeroing) are skipped and counted. A series whose last bin lies
//! implausibly far out for its row count (usually a mistyped time) is
//! rejected as `MalformedValue` instead of being expanded.

use std::collections::BTreeMap;

use log::warn;

use crate::domain::{Channel, PostbleachSeries, ResampledSeries, TimeBin};
use crate::error::{AppError, ErrorKind};

/// Default bin width in seconds.
pub const DEFAULT_PACE: u32 = 1;

/// Gap bins tolerated per placed row.
const MAX_BINS_PER_ROW: u64 = 1_000;

/// Hard ceiling on the number of bins of one series.
pub const MAX_BINS: u64 = 1_000_000;

/// Largest bin count accepted for a series with `rows` placed rows.
pub fn max_bin_span(rows: usize) -> u64 {
    (rows.max(1) as u64)
        .saturating_mul(MAX_BINS_PER_ROW)
        .min(MAX_BINS)
}

/// Resampled series plus bookkeeping about rows that were left out.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampleOutcome {
    pub series: ResampledSeries,
    /// Rows skipped because their time was missing or not finite.
    pub unusable_time: usize,
    /// Rows skipped because their zeroed time was negative.
    pub before_origin: usize,
}

impl ResampleOutcome {
    pub fn skipped_rows(&self) -> usize {
        self.unusable_time + self.before_origin
    }
}

#[derive(Debug, Default)]
struct BinAccumulator {
    rows: usize,
    sums: BTreeMap<Channel, (f64, usize)>,
}

impl BinAccumulator {
    fn finish(&self, index: u64, channels: &[Channel]) -> TimeBin {
        let values = channels
            .iter()
            .map(|&channel| {
                let value = self
                    .sums
                    .get(&channel)
                    .filter(|(_, n)| *n > 0)
                    .map(|(sum, n)| sum / *n as f64);
                (channel, value)
            })
            .collect();
        TimeBin {
            index,
            rows: self.rows,
            values,
        }
    }
}

/// Map a zeroed time to its bin index.
pub fn bin_index(time: f64, pace: u32) -> Option<u64> {
    if !time.is_finite() || time < 0.0 || pace == 0 {
        return None;
    }
    Some((time / f64::from(pace)).floor() as u64)
}

/// Resample one sample's postbleach series onto bins of width `pace` seconds.
pub fn resample(series: &PostbleachSeries, pace: u32) -> Result<ResampleOutcome, AppError> {
    if pace == 0 {
        return Err(AppError::new(ErrorKind::Usage, "Pace must be a positive number of seconds."));
    }

    let channels: Vec<Channel> = series.channels.keys().copied().collect();
    let mut bins: BTreeMap<u64, BinAccumulator> = BTreeMap::new();
    let mut unusable_time = 0usize;
    let mut before_origin = 0usize;

    for (row, time) in series.time.iter().enumerate() {
        let Some(t) = time.filter(|t| t.is_finite()) else {
            unusable_time += 1;
            continue;
        };
        let Some(k) = bin_index(t, pace) else {
            before_origin += 1;
            continue;
        };

        let acc = bins.entry(k).or_default();
        acc.rows += 1;
        for &channel in &channels {
            let value = series
                .channels
                .get(&channel)
                .and_then(|cells| cells.get(row).copied().flatten())
                .filter(|v| v.is_finite());
            if let Some(v) = value {
                let slot = acc.sums.entry(channel).or_insert((0.0, 0));
                slot.0 += v;
                slot.1 += 1;
            }
        }
    }

    if unusable_time > 0 {
        warn!(
            "sample {}: skipped {unusable_time} row(s) with missing or non-numeric time",
            series.sample
        );
    }
    if before_origin > 0 {
        warn!(
            "sample {}: skipped {before_origin} row(s) timed before the first postbleach row",
            series.sample
        );
    }

    let last = bins.keys().next_back().copied();
    if let Some(last) = last {
        let placed: usize = bins.values().map(|acc| acc.rows).sum();
        let span = last.saturating_add(1);
        if span > max_bin_span(placed) {
            return Err(AppError::new(
                ErrorKind::MalformedValue,
                format!(
                    "Sample {}: a time of about {}s after bleaching would need {span} bins of {pace}s for {placed} row(s); check the time column.",
                    series.sample,
                    last.saturating_mul(u64::from(pace))
                ),
            ));
        }
    }

    let empty = BinAccumulator::default();
    let dense = match last {
        Some(last) => (0..=last)
            .map(|k| bins.get(&k).unwrap_or(&empty).finish(k, &channels))
            .collect(),
        None => Vec::new(),
    };

    Ok(ResampleOutcome {
        series: ResampledSeries {
            sample: series.sample,
            pace,
            bins: dense,
        },
        unusable_time,
        before_origin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Cell;

    fn postbleach(time: &[Cell], cp: &[Cell]) -> PostbleachSeries {
        let mut channels = BTreeMap::new();
        channels.insert(Channel::Cp, cp.to_vec());
        PostbleachSeries {
            sample: 1,
            time: time.to_vec(),
            channels,
        }
    }

    fn some(values: &[f64]) -> Vec<Cell> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn one_row_per_bin_is_unchanged() {
        let s = postbleach(&some(&[0.0, 1.0, 2.0, 3.0, 4.0]), &some(&[10.0, 40.0, 60.0, 75.0, 85.0]));
        let out = resample(&s, 1).unwrap();

        assert_eq!(out.series.channel(Channel::Cp), some(&[10.0, 40.0, 60.0, 75.0, 85.0]));
        assert_eq!(out.skipped_rows(), 0);
    }

    #[test]
    fn coarser_pace_averages_rows_in_each_bin() {
        let s = postbleach(
            &some(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]),
            &some(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0]),
        );
        let out = resample(&s, 2).unwrap();

        assert_eq!(out.series.channel(Channel::Cp), some(&[15.0, 35.0, 55.0]));
        assert!(out.series.bins.iter().all(|b| b.rows == 2));
    }

    #[test]
    fn averages_every_row_when_pace_is_much_coarser() {
        let s = postbleach(
            &some(&[0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0]),
            &some(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]),
        );
        let out = resample(&s, 4).unwrap();

        assert_eq!(out.series.len(), 2);
        assert_eq!(out.series.bins[0].rows, 8);
        assert_eq!(out.series.channel(Channel::Cp), some(&[4.5, 9.0]));
    }

    #[test]
    fn jittered_subsecond_rows_share_a_bin() {
        let s = postbleach(&some(&[0.0, 0.4, 0.9, 1.3, 2.2]), &some(&[3.0, 6.0, 9.0, 2.0, 4.0]));
        let out = resample(&s, 1).unwrap();
        assert_eq!(out.series.channel(Channel::Cp), some(&[6.0, 2.0, 4.0]));
    }

    #[test]
    fn empty_bins_are_gaps_not_zeros() {
        let s = postbleach(&some(&[0.0, 3.0]), &some(&[1.0, 2.0]));
        let out = resample(&s, 1).unwrap();

        assert_eq!(out.series.channel(Channel::Cp), vec![Some(1.0), None, None, Some(2.0)]);
        assert_eq!(out.series.bins[1].rows, 0);
    }

    #[test]
    fn bins_increase_by_exactly_one() {
        let s = postbleach(&some(&[0.0, 0.7, 2.9, 5.1, 9.99]), &some(&[1.0; 5]));
        let out = resample(&s, 2).unwrap();
        for (i, bin) in out.series.bins.iter().enumerate() {
            assert_eq!(bin.index, i as u64);
        }
    }

    #[test]
    fn every_row_falls_inside_the_series_span() {
        let times = [0.0, 0.3, 1.7, 2.2, 6.8, 7.1];
        let s = postbleach(&some(&times), &some(&[1.0; 6]));
        let pace = 3;
        let out = resample(&s, pace).unwrap();

        let first = out.series.bin_start(0);
        let end = out.series.bin_start(out.series.len() - 1) + f64::from(pace);
        assert!(times.iter().all(|&t| t >= first && t < end));
    }

    #[test]
    fn unusable_rows_are_skipped_and_counted() {
        let s = postbleach(
            &[Some(0.0), None, Some(f64::NAN), Some(-1.0), Some(1.0)],
            &some(&[1.0, 100.0, 100.0, 100.0, 2.0]),
        );
        let out = resample(&s, 1).unwrap();

        assert_eq!(out.series.channel(Channel::Cp), some(&[1.0, 2.0]));
        assert_eq!(out.unusable_time, 2);
        assert_eq!(out.before_origin, 1);
    }

    #[test]
    fn missing_values_do_not_dilute_the_bin_mean() {
        let s = postbleach(&some(&[0.0, 0.5]), &[Some(4.0), None]);
        let out = resample(&s, 1).unwrap();
        assert_eq!(out.series.channel(Channel::Cp), vec![Some(4.0)]);
        assert_eq!(out.series.bins[0].rows, 2);
    }

    #[test]
    fn resampling_is_deterministic() {
        let s = postbleach(&some(&[0.0, 0.2, 1.1, 1.9, 3.5]), &some(&[5.0, 4.0, 3.0, 2.0, 1.0]));
        assert_eq!(resample(&s, 1).unwrap(), resample(&s, 1).unwrap());
    }

    #[test]
    fn outlier_time_fails_the_sample_instead_of_expanding() {
        for outlier in [1e7, 1e18] {
            let s = postbleach(&some(&[0.0, 1.0, outlier]), &some(&[1.0, 2.0, 3.0]));
            let err = resample(&s, 1).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedValue);
        }
    }

    #[test]
    fn sparse_but_plausible_series_is_kept() {
        // 3 rows, one per minute, at a 1 s pace.
        let s = postbleach(&some(&[0.0, 60.0, 120.0]), &some(&[1.0, 2.0, 3.0]));
        let out = resample(&s, 1).unwrap();
        assert_eq!(out.series.len(), 121);
        assert_eq!(max_bin_span(3), 3_000);
        assert_eq!(max_bin_span(usize::MAX), MAX_BINS);
    }

    #[test]
    fn zero_pace_is_rejected() {
        let s = postbleach(&some(&[0.0]), &some(&[1.0]));
        assert_eq!(resample(&s, 0).unwrap_err().kind(), ErrorKind::Usage);
    }
}
