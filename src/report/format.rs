//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the pipeline code stays clean and testable
//! - output changes are localized

use std::path::Path;

use crate::app::pipeline::RunOutput;
use crate::domain::RunConfig;

/// Format the full run summary (input, options, samples, roles).
pub fn format_run_summary(run: &RunOutput, config: &RunConfig) -> String {
    let mut out = String::new();

    out.push_str("=== frap - FRAP recovery processing ===\n");
    out.push_str(&format!("Input: {}\n", config.input_path.display()));
    out.push_str(&format!(
        "Rows: {} read | {} non-numeric cell(s) ignored\n",
        run.ingest.rows_read,
        run.ingest.cell_issues.len()
    ));
    out.push_str(&format!(
        "Options: reference={} | background={} | pace={}s\n",
        yes_no(config.normalize_to_reference),
        yes_no(config.effective_background_subtraction()),
        config.pace
    ));

    out.push_str(&format!("\nSamples used: {}\n", run.samples.len()));
    out.push_str(format!("{:<8} {:>6} {:>10} {:>6} {:>8} {:<16}", "sample", "rows", "postbleach", "bins", "skipped", "channels").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<8} {:-<6} {:-<10} {:-<6} {:-<8} {:-<16}", "", "", "", "", "", "").trim_end());
    out.push('\n');
    for s in &run.samples {
        let channels: Vec<&str> = s.channels.iter().map(|c| c.label()).collect();
        out.push_str(
            format!(
                "{:<8} {:>6} {:>10} {:>6} {:>8} {:<16}",
                s.index,
                s.rows,
                s.postbleach_rows,
                s.bins,
                s.skipped_rows,
                channels.join(",")
            )
            .trim_end(),
        );
        out.push('\n');
    }

    if !run.skipped.is_empty() {
        out.push_str("\nSkipped:\n");
        for s in &run.skipped {
            out.push_str(&format!("- {}: {}\n", s.what, s.reason));
        }
    }

    out.push_str("\nRoles:\n");
    for role in &run.roles {
        let aggregate = match &role.aggregate {
            Some(agg) => format!("mean/SEM over {} samples", agg.samples),
            None => "single sample, no mean/SEM".to_string(),
        };
        out.push_str(&format!(
            "- {:<5} samples={} aligned_rows={} ({aggregate})\n",
            role.channel.label(),
            role.aligned.columns.len(),
            role.aligned.len
        ));
    }

    if run.dropped_cells > 0 {
        out.push_str(&format!(
            "\nWarning: {} cell(s) dropped (zero or non-finite denominator).\n",
            run.dropped_cells
        ));
    }

    out
}

/// One line per file written (or refused).
pub fn format_written(path: &Path, what: &str) -> String {
    let dir = std::env::current_dir()
        .map(|d| d.display().to_string())
        .unwrap_or_else(|_| ".".to_string());
    format!("File '{}' ({what}) created in {dir}", path.display())
}

fn yes_no(v: bool) -> &'static str {
    if v { "yes" } else { "no" }
}
