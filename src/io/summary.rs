//! JSON run summary.
//!
//! A machine-readable record of one run: the resolved configuration, what
//! happened to each sample, per-role alignment and the files written. Handy
//! for keeping alongside the output sheets of a batch.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::app::pipeline::RunOutput;
use crate::domain::{Channel, PrebleachBaseline, RunConfig, SampleIndex};
use crate::error::AppError;
use crate::io::export::write_new_file;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub tool: String,
    pub generated_at: DateTime<Local>,
    pub config: RunConfig,
    pub rows_read: usize,
    pub cell_issues: usize,
    pub dropped_cells: usize,
    pub samples: Vec<SampleSummary>,
    pub skipped: Vec<SkippedSummary>,
    pub roles: Vec<RoleSummary>,
    pub outputs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleSummary {
    pub index: SampleIndex,
    pub rows: usize,
    pub postbleach_rows: usize,
    pub bins: usize,
    pub skipped_rows: usize,
    pub baseline: PrebleachBaseline,
    pub channels: Vec<Channel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedSummary {
    pub what: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleSummary {
    pub channel: Channel,
    pub samples: Vec<SampleIndex>,
    pub aligned_rows: usize,
    pub aggregated: bool,
}

impl RunSummary {
    pub fn from_run(run: &RunOutput, config: &RunConfig, outputs: Vec<PathBuf>) -> Self {
        Self {
            tool: "frap".to_string(),
            generated_at: Local::now(),
            config: config.clone(),
            rows_read: run.ingest.rows_read,
            cell_issues: run.ingest.cell_issues.len(),
            dropped_cells: run.dropped_cells,
            samples: run
                .samples
                .iter()
                .map(|s| SampleSummary {
                    index: s.index,
                    rows: s.rows,
                    postbleach_rows: s.postbleach_rows,
                    bins: s.bins,
                    skipped_rows: s.skipped_rows,
                    baseline: s.baseline.clone(),
                    channels: s.channels.clone(),
                })
                .collect(),
            skipped: run
                .skipped
                .iter()
                .map(|s| SkippedSummary {
                    what: s.what.clone(),
                    reason: s.reason.to_string(),
                })
                .collect(),
            roles: run
                .roles
                .iter()
                .map(|r| RoleSummary {
                    channel: r.channel,
                    samples: r.aligned.samples(),
                    aligned_rows: r.aligned.len,
                    aggregated: r.aggregate.is_some(),
                })
                .collect(),
            outputs,
        }
    }
}

/// Write the summary as pretty JSON to a new file.
pub fn write_summary_json(path: &Path, summary: &RunSummary) -> Result<(), AppError> {
    write_new_file(path, |file| serde_json::to_writer_pretty(file, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::run_pipeline_with_table;
    use crate::io::ingest::read_table;

    #[test]
    fn summary_serializes_roles_and_baselines() {
        let csv = "time_s_1,cp_1,time_s_2,cp_2\n0,9,0,8\n1,9,1,8\n2,9,2,8\n3,1,3,2\n4,5,4,5\n";
        let config = RunConfig {
            input_path: PathBuf::from("in.csv"),
            normalize_to_reference: false,
            subtract_background: false,
            pace: 1,
            plot_output: PathBuf::from("plot.csv"),
            curve_fit_output: None,
            summary_json: None,
            plot: false,
            plot_width: 60,
            plot_height: 15,
        };
        let run = run_pipeline_with_table(&config, read_table(csv.as_bytes()).unwrap()).unwrap();
        let summary = RunSummary::from_run(&run, &config, vec![PathBuf::from("plot.csv")]);
        let json: serde_json::Value = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["tool"], "frap");
        assert_eq!(json["roles"][0]["channel"], "cp");
        assert_eq!(json["roles"][0]["aligned_rows"], 3);
        assert_eq!(json["samples"][1]["baseline"]["channels"]["cp"], 8.0);
        assert_eq!(json["config"]["pace"], 1);
    }
}
