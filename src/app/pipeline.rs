//! Shared processing pipeline used by both the scripted and interactive front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest -> classify -> (normalize) -> strip prebleach -> resample -> align -> aggregate -> compose
//!
//! Failures that concern one sample or one role drop just that sample/role
//! (with a warning and an entry in `RunOutput::skipped`). The run only fails
//! when nothing usable is left.

use std::collections::BTreeMap;

use log::{info, warn};

use crate::domain::{
    Cell, Channel, OutputTable, PrebleachBaseline, RunConfig, Sample, SampleColumn, SampleIndex,
};
use crate::error::{AppError, ErrorKind};
use crate::io::ingest::{IngestedTable, load_table};
use crate::report::compose::{CurveFitSample, RolePlot, compose_curve_fit_table, compose_plot_table};
use crate::series::{
    StrippedSample, align_columns, classify_columns, extract_samples, resample, strip_prebleach,
};
use crate::stats::{aggregate_role, min_max_scale, normalize_to_reference};

/// What happened to one processed sample.
#[derive(Debug, Clone)]
pub struct SampleReport {
    pub index: SampleIndex,
    pub rows: usize,
    pub postbleach_rows: usize,
    pub bins: usize,
    pub skipped_rows: usize,
    pub baseline: PrebleachBaseline,
    /// Channels that made it into the plot sheet.
    pub channels: Vec<Channel>,
}

/// A sample (or role) left out of the run, with the reason.
#[derive(Debug, Clone)]
pub struct Skipped {
    pub what: String,
    pub reason: AppError,
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedTable,
    pub samples: Vec<SampleReport>,
    pub skipped: Vec<Skipped>,
    pub roles: Vec<RolePlot>,
    pub plot_table: OutputTable,
    pub curve_fit_table: Option<OutputTable>,
    /// Cells that became missing during normalization or scaling.
    pub dropped_cells: usize,
}

struct ProcessedSample {
    report: SampleReport,
    plot_columns: BTreeMap<Channel, Vec<Cell>>,
    curve_fit: Option<CurveFitSample>,
    dropped_cells: usize,
}

/// Execute the full pipeline, reading the input named in `config`.
pub fn run_pipeline(config: &RunConfig) -> Result<RunOutput, AppError> {
    let ingest = load_table(&config.input_path)?;
    run_pipeline_with_table(config, ingest)
}

/// Execute the pipeline on an already ingested sheet.
pub fn run_pipeline_with_table(config: &RunConfig, ingest: IngestedTable) -> Result<RunOutput, AppError> {
    if config.pace == 0 {
        return Err(AppError::new(ErrorKind::Usage, "Pace must be a positive number of seconds."));
    }

    // 1) Group columns into samples.
    let layout = classify_columns(ingest.table.column_names())?;
    let mut skipped: Vec<Skipped> = layout
        .rejected
        .iter()
        .map(|(index, err)| skip(format!("sample {index}"), err.clone()))
        .collect();
    let samples = extract_samples(&ingest.table, &layout);

    // 2) Per-sample processing.
    let mut reports = Vec::new();
    let mut plot_columns: BTreeMap<Channel, Vec<SampleColumn>> = BTreeMap::new();
    let mut curve_fit_samples = Vec::new();
    let mut dropped_cells = 0usize;

    for sample in &samples {
        match process_sample(sample, config) {
            Ok(processed) => {
                dropped_cells += processed.dropped_cells;
                for (channel, cells) in processed.plot_columns {
                    plot_columns.entry(channel).or_default().push(SampleColumn {
                        sample: sample.index,
                        cells,
                    });
                }
                curve_fit_samples.extend(processed.curve_fit);
                reports.push(processed.report);
            }
            Err(err) => skipped.push(skip(format!("sample {}", sample.index), err)),
        }
    }

    if reports.is_empty() {
        return Err(AppError::new(
            ErrorKind::InsufficientData,
            "No sample could be processed; nothing to write.",
        ));
    }

    // 3) Align and aggregate per role.
    let mut roles = Vec::new();
    for (channel, columns) in plot_columns {
        match align_columns(columns) {
            Ok(aligned) => {
                let aggregate = aggregate_role(channel, &aligned);
                if aggregate.is_none() {
                    info!(
                        "{}: only {} sample(s), no mean/SEM computed",
                        channel.label(),
                        aligned.columns.len()
                    );
                }
                roles.push(RolePlot { channel, aligned, aggregate });
            }
            Err(err) => skipped.push(skip(channel.label().to_string(), err)),
        }
    }

    if roles.is_empty() {
        return Err(AppError::new(
            ErrorKind::InsufficientData,
            "No channel produced any resampled values; nothing to write.",
        ));
    }

    // 4) Compose output sheets.
    let plot_table = compose_plot_table(config.pace, &roles);
    let curve_fit_table = config
        .generate_curve_fit()
        .then(|| compose_curve_fit_table(&curve_fit_samples));

    Ok(RunOutput {
        ingest,
        samples: reports,
        skipped,
        roles,
        plot_table,
        curve_fit_table,
        dropped_cells,
    })
}

fn skip(what: String, reason: AppError) -> Skipped {
    warn!("skipping {what}: {reason}");
    Skipped { what, reason }
}

fn process_sample(sample: &Sample, config: &RunConfig) -> Result<ProcessedSample, AppError> {
    let mut dropped_cells = 0usize;

    let normalized;
    let sample = if config.normalize_to_reference {
        let (out, dropped) = normalize_to_reference(sample, config.effective_background_subtraction())?;
        dropped_cells += dropped;
        normalized = out;
        &normalized
    } else {
        sample
    };

    let stripped = strip_prebleach(sample)?;
    let outcome = resample(&stripped.postbleach, config.pace)?;
    let series = &outcome.series;

    // Plot columns: [prebleach baseline, bin 0, bin 1, ...] scaled so the
    // baseline is 1 and the first postbleach bin is 0.
    let mut plot_columns = BTreeMap::new();
    for &channel in stripped.postbleach.channels.keys() {
        let bins = series.channel(channel);
        let baseline = stripped.baseline.get(channel);
        let first = bins.first().copied().flatten();
        let (Some(baseline), Some(first)) = (baseline, first) else {
            warn!(
                "sample {}: `{}` has no prebleach baseline or no value in the first bin, left out",
                sample.index,
                channel.label()
            );
            continue;
        };

        let mut cells = Vec::with_capacity(bins.len() + 1);
        cells.push(Some(baseline));
        cells.extend(bins);
        match min_max_scale(&cells, first, baseline) {
            Some(scaled) => {
                plot_columns.insert(channel, scaled);
            }
            None => {
                dropped_cells += cells.len();
                warn!(
                    "sample {}: `{}` prebleach baseline equals the first postbleach value, left out",
                    sample.index,
                    channel.label()
                );
            }
        }
    }

    let curve_fit = config
        .generate_curve_fit()
        .then(|| curve_fit_series(sample.index, &stripped, &mut dropped_cells));

    Ok(ProcessedSample {
        report: SampleReport {
            index: sample.index,
            rows: sample.len(),
            postbleach_rows: stripped.postbleach.time.len(),
            bins: series.len(),
            skipped_rows: outcome.skipped_rows(),
            baseline: stripped.baseline.clone(),
            channels: plot_columns.keys().copied().collect(),
        },
        plot_columns,
        curve_fit,
        dropped_cells,
    })
}

/// Raw postbleach values scaled as `(v - v_first) / (baseline - v_first)`.
fn curve_fit_series(
    index: SampleIndex,
    stripped: &StrippedSample,
    dropped_cells: &mut usize,
) -> CurveFitSample {
    let mut channels = BTreeMap::new();
    for (&channel, cells) in &stripped.postbleach.channels {
        let first = cells.first().copied().flatten();
        let scaled = match (stripped.baseline.get(channel), first) {
            (Some(baseline), Some(first)) => min_max_scale(cells, first, baseline),
            _ => None,
        };
        match scaled {
            Some(scaled) => {
                channels.insert(channel, scaled);
            }
            None => {
                *dropped_cells += cells.len();
                warn!(
                    "sample {index}: `{}` cannot be min/max scaled for the curve-fit sheet, left out",
                    channel.label()
                );
            }
        }
    }

    CurveFitSample {
        index,
        time: stripped.postbleach.time.clone(),
        channels,
    }
}
