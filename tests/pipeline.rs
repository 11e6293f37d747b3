//! End-to-end runs over in-memory sheets.

use std::path::PathBuf;

use frap_curves::app::pipeline::{RunOutput, run_pipeline_with_table};
use frap_curves::domain::{Cell, Channel, PostbleachSeries, RunConfig, Sample, SampleColumn};
use frap_curves::error::{AppError, ErrorKind};
use frap_curves::io::export::write_table_csv;
use frap_curves::io::ingest::read_table;
use frap_curves::series::{align_columns, resample, strip_prebleach};
use frap_curves::stats::aggregate_role;

fn config(pace: u32) -> RunConfig {
    RunConfig {
        input_path: PathBuf::from("in-memory.csv"),
        normalize_to_reference: false,
        subtract_background: false,
        pace,
        plot_output: PathBuf::from("plot.csv"),
        curve_fit_output: None,
        summary_json: None,
        plot: false,
        plot_width: 60,
        plot_height: 15,
    }
}

fn run(csv: &str, config: &RunConfig) -> Result<RunOutput, AppError> {
    run_pipeline_with_table(config, read_table(csv.as_bytes())?)
}

fn assert_cells(actual: &[Cell], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        let a = a.unwrap_or(f64::NAN);
        assert!((a - e).abs() < 1e-9, "{actual:?} vs {expected:?}");
    }
}

fn cells(values: &[f64]) -> Vec<Cell> {
    values.iter().copied().map(Some).collect()
}

#[test]
fn one_row_per_bin_is_kept_as_is() {
    let sample = Sample {
        index: 1,
        time: cells(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]),
        background: None,
        reference: None,
        channels: [(Channel::Cp, cells(&[100.0, 100.0, 100.0, 10.0, 40.0, 60.0, 75.0, 85.0]))]
            .into_iter()
            .collect(),
    };

    let stripped = strip_prebleach(&sample).unwrap();
    assert_cells(&stripped.postbleach.time, &[0.0, 1.0, 2.0, 3.0, 4.0]);
    assert_eq!(stripped.baseline.get(Channel::Cp), Some(100.0));

    let outcome = resample(&stripped.postbleach, 1).unwrap();
    assert_eq!(outcome.skipped_rows(), 0);
    assert_cells(&outcome.series.channel(Channel::Cp), &[10.0, 40.0, 60.0, 75.0, 85.0]);
}

#[test]
fn two_second_pace_averages_pairs_across_samples() {
    let csv = "\
time_s_1,cp_1,time_s_2,cp_2
0,50,0,100
1,50,1,100
2,50,2,100
3,10,3,0
4,20,4,10
5,30,5,20
6,40,6,30
7,50,7,40
8,60,8,50
";
    let out = run(csv, &config(2)).unwrap();

    assert!(out.samples.iter().all(|s| s.bins == 3));
    let role = &out.roles[0];
    // Bins 15/35/55 and 5/25/45, scaled against the baselines 50 and 100.
    assert_cells(&role.aligned.columns[0].cells, &[1.0, 0.0, 20.0 / 35.0, 40.0 / 35.0]);
    assert_cells(&role.aligned.columns[1].cells, &[1.0, 0.0, 20.0 / 95.0, 40.0 / 95.0]);

    let time = out.plot_table.column("time").unwrap();
    assert_cells(&time.cells, &[-2.0, 0.0, 2.0, 4.0]);
    let mean = out.plot_table.column("cp_mean").unwrap();
    assert!((mean.cells[2].unwrap() - (20.0 / 35.0 + 20.0 / 95.0) / 2.0).abs() < 1e-9);
    assert!(out.plot_table.column("cp_SEM").unwrap().cells[1].unwrap().abs() < 1e-12);
}

#[test]
fn two_row_sample_is_insufficient() {
    let sample = Sample {
        index: 1,
        time: cells(&[0.0, 1.0]),
        background: None,
        reference: None,
        channels: [(Channel::Cp, cells(&[5.0, 5.0]))].into_iter().collect(),
    };
    assert_eq!(strip_prebleach(&sample).unwrap_err().kind(), ErrorKind::InsufficientData);

    let err = run("time_s_1,cp_1\n0,5\n1,5\n", &config(1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientData);
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn aligned_length_is_the_shortest_sample() {
    let columns = [(1, 10), (2, 8), (3, 9)]
        .into_iter()
        .map(|(sample, len)| SampleColumn {
            sample,
            cells: (0..len).map(|i| Some(i as f64 + f64::from(sample))).collect(),
        })
        .collect();

    let aligned = align_columns(columns).unwrap();
    assert_eq!(aligned.len, 8);
    assert!(aligned.columns.iter().all(|c| c.cells.len() == 8));

    let agg = aggregate_role(Channel::Cp, &aligned).unwrap();
    assert_eq!(agg.len(), 8);
    // Row 0 holds 1, 2, 3.
    assert_cells(&agg.means()[..1], &[2.0]);
    assert_cells(&agg.sems()[..1], &[1.0 / 3f64.sqrt()]);
}

#[test]
fn reference_ratio_without_background_uses_zero() {
    let csv = "\
time_s_1,back_1,ref_1,cp_1
0,1,2,100
1,1,2,100
2,1,2,100
3,1,2,10
4,1,4,40
";
    let mut cfg = config(1);
    cfg.normalize_to_reference = true;

    // cp / ref: 50, 50, 50, 5, 10
    let out = run(csv, &cfg).unwrap();
    assert_cells(&out.roles[0].aligned.columns[0].cells, &[1.0, 0.0, 5.0 / 45.0]);
    assert_eq!(out.samples[0].baseline.get(Channel::Cp), Some(50.0));

    // (cp - back) / (ref - back): 99, 99, 99, 9, 13
    cfg.subtract_background = true;
    let out = run(csv, &cfg).unwrap();
    assert_cells(&out.roles[0].aligned.columns[0].cells, &[1.0, 0.0, 4.0 / 90.0]);
}

#[test]
fn postbleach_series_with_gap_keeps_dense_bins() {
    let series = PostbleachSeries {
        sample: 1,
        time: cells(&[0.0, 0.5, 3.2]),
        channels: [(Channel::Long, cells(&[2.0, 4.0, 9.0]))].into_iter().collect(),
    };
    let outcome = resample(&series, 1).unwrap();
    let values = outcome.series.channel(Channel::Long);
    assert_eq!(values, vec![Some(3.0), None, None, Some(9.0)]);
}

#[test]
fn sheets_are_written_once_and_never_overwritten() {
    let csv = "time_s_1,cp_1,time_s_2,cp_2\n0,9,0,8\n1,9,1,8\n2,9,2,8\n3,1,3,2\n4,5,4,5\n";
    let mut cfg = config(1);
    cfg.curve_fit_output = Some(PathBuf::from("fit.csv"));
    let out = run(csv, &cfg).unwrap();

    let dir = std::env::temp_dir().join(format!("frap-pipeline-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let plot = dir.join("plot.csv");
    let fit = dir.join("fit.csv");
    let _ = std::fs::remove_file(&plot);
    let _ = std::fs::remove_file(&fit);

    write_table_csv(&plot, &out.plot_table).unwrap();
    write_table_csv(&fit, out.curve_fit_table.as_ref().unwrap()).unwrap();

    let text = std::fs::read_to_string(&plot).unwrap();
    let header = text.lines().next().unwrap();
    assert_eq!(header, "time,cp_mean,cp_SEM,,time,cp_1,cp_2");

    let text = std::fs::read_to_string(&fit).unwrap();
    assert_eq!(text.lines().next().unwrap(), "time_s_1,cp_1,time_s_2,cp_2");

    let err = write_table_csv(&plot, &out.plot_table).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutputCollision);
    assert_eq!(std::fs::read_to_string(&plot).unwrap().lines().next().unwrap(), header);

    std::fs::remove_dir_all(&dir).unwrap();
}
