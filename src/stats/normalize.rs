//! Elementwise normalizations.
//!
//! - reference ratio: `(v - back) / (ref - back)`, with `back = 0` when
//!   background subtraction is off
//! - min/max scaling: `(v - floor) / (ceiling - floor)`
//!
//! Division by zero or a non-finite result makes the cell missing; callers
//! get a count of such cells so they can report them.

use log::warn;

use crate::domain::{Cell, Sample};
use crate::error::{AppError, ErrorKind};

/// Ranges narrower than this are treated as zero.
const MIN_RANGE: f64 = 1e-12;

/// Ratio of a measured value to the reference region.
pub fn ratio_to_reference(value: f64, reference: f64, background: f64) -> Option<f64> {
    let denom = reference - background;
    if !denom.is_finite() || denom.abs() < MIN_RANGE {
        return None;
    }
    let out = (value - background) / denom;
    out.is_finite().then_some(out)
}

/// Normalize every channel of a sample to its reference region.
///
/// Returns the normalized sample and the number of channel cells that
/// became missing because of a zero or non-finite denominator.
pub fn normalize_to_reference(sample: &Sample, subtract_background: bool) -> Result<(Sample, usize), AppError> {
    let Some(reference) = sample.reference.as_ref() else {
        return Err(AppError::new(
            ErrorKind::Schema,
            format!(
                "Sample {}: reference normalization requested but `ref_{}` is missing.",
                sample.index, sample.index
            ),
        ));
    };

    let background = if subtract_background {
        if sample.background.is_none() {
            warn!(
                "sample {}: `back_{}` is missing, background treated as 0",
                sample.index, sample.index
            );
        }
        sample.background.as_ref()
    } else {
        None
    };

    let mut dropped = 0usize;
    let mut out = sample.clone();

    for cells in out.channels.values_mut() {
        for (row, cell) in cells.iter_mut().enumerate() {
            let Some(value) = *cell else { continue };
            let r = reference.get(row).copied().flatten();
            let b = match background {
                Some(back) => back.get(row).copied().flatten(),
                None => Some(0.0),
            };
            *cell = match (r, b) {
                (Some(r), Some(b)) => ratio_to_reference(value, r, b),
                _ => None,
            };
            if cell.is_none() {
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        warn!(
            "sample {}: {dropped} cell(s) could not be normalized to the reference (missing or zero denominator)",
            sample.index
        );
    }

    Ok((out, dropped))
}

/// Scale cells so `floor` maps to 0 and `ceiling` maps to 1.
///
/// Returns `None` when the range is zero or not finite.
pub fn min_max_scale(cells: &[Cell], floor: f64, ceiling: f64) -> Option<Vec<Cell>> {
    let range = ceiling - floor;
    if !range.is_finite() || range.abs() < MIN_RANGE {
        return None;
    }
    Some(
        cells
            .iter()
            .map(|cell| cell.map(|v| (v - floor) / range).filter(|v| v.is_finite()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::domain::Channel;

    fn sample_with(back: Option<Vec<Cell>>, reference: Option<Vec<Cell>>, cp: Vec<Cell>) -> Sample {
        let mut channels = BTreeMap::new();
        channels.insert(Channel::Cp, cp);
        Sample {
            index: 1,
            time: vec![Some(0.0); 2],
            background: back,
            reference,
            channels,
        }
    }

    #[test]
    fn background_ignored_when_subtraction_is_off() {
        let s = sample_with(
            Some(vec![Some(10.0), Some(10.0)]),
            Some(vec![Some(200.0), Some(100.0)]),
            vec![Some(100.0), Some(50.0)],
        );
        let (out, dropped) = normalize_to_reference(&s, false).unwrap();
        assert_eq!(out.channels[&Channel::Cp], vec![Some(0.5), Some(0.5)]);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn background_subtracted_when_requested() {
        let s = sample_with(
            Some(vec![Some(10.0), Some(10.0)]),
            Some(vec![Some(110.0), Some(60.0)]),
            vec![Some(60.0), Some(35.0)],
        );
        let (out, _) = normalize_to_reference(&s, true).unwrap();
        assert_eq!(out.channels[&Channel::Cp], vec![Some(0.5), Some(0.5)]);
    }

    #[test]
    fn zero_denominator_drops_the_cell() {
        let s = sample_with(None, Some(vec![Some(0.0), Some(4.0)]), vec![Some(1.0), Some(2.0)]);
        let (out, dropped) = normalize_to_reference(&s, false).unwrap();
        assert_eq!(out.channels[&Channel::Cp], vec![None, Some(0.5)]);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn missing_reference_column_is_a_schema_error() {
        let s = sample_with(None, None, vec![Some(1.0)]);
        assert_eq!(normalize_to_reference(&s, false).unwrap_err().kind(), ErrorKind::Schema);
    }

    #[test]
    fn min_max_maps_floor_and_ceiling() {
        let scaled = min_max_scale(&[Some(100.0), Some(10.0), Some(55.0), None], 10.0, 100.0).unwrap();
        assert_eq!(scaled, vec![Some(1.0), Some(0.0), Some(0.5), None]);
        assert!(min_max_scale(&[Some(1.0)], 5.0, 5.0).is_none());
    }
}
