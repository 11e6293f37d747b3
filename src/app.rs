//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments (or asks the questions interactively)
//! - runs the processing pipeline
//! - prints the run summary and optional terminal plot
//! - writes the output sheets

use std::path::{Path, PathBuf};

use clap::Parser;
use log::{LevelFilter, debug, warn};

use crate::cli::prompt::{Prompter, discover_csv_files, prompt_run_config};
use crate::cli::{Command, Defaults, DisplayArgs, ProcessArgs};
use crate::domain::RunConfig;
use crate::error::{AppError, ErrorKind};
use crate::io::export::{output_path, write_table_csv};
use crate::io::summary::{RunSummary, write_summary_json};

pub mod pipeline;

/// Entry point for the `frap` binary.
pub fn run() -> Result<(), AppError> {
    // `frap` alone asks questions; `frap -f data.csv ...` is a scripted run.
    //
    // Clap requires a subcommand name, so argv is rewritten before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    init_logging(cli.verbose);

    let defaults = Defaults::from_env();
    debug!("defaults: pace={}s", defaults.pace);

    let config = match cli.command {
        Command::Process(args) => config_from_args(&args, &defaults),
        Command::Interactive(display) => interactive_config(&defaults, &display)?,
    };

    handle_run(&config)
}

/// Install the `env_logger` backend.
///
/// `RUST_LOG` wins over `-v`; without either only warnings are shown.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).format_timestamp(None);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    // A logger may already be installed (tests, embedding); that is fine.
    let _ = builder.try_init();
}

fn interactive_config(defaults: &Defaults, display: &DisplayArgs) -> Result<RunConfig, AppError> {
    let files = discover_csv_files();
    let mut prompter = Prompter::stdio();
    prompt_run_config(&mut prompter, &files, defaults, display)
}

fn handle_run(config: &RunConfig) -> Result<(), AppError> {
    let run = pipeline::run_pipeline(config)?;

    println!("{}", crate::report::format_run_summary(&run, config));

    if config.plot {
        let plot = crate::plot::render_recovery_plot(&run.roles, config.pace, config.plot_width, config.plot_height);
        println!("{plot}");
    }

    // Outputs never overwrite; a collision on one file does not stop the others.
    let mut outputs = Outputs::default();

    outputs.record(
        write_table_csv(&config.plot_output, &run.plot_table),
        &config.plot_output,
        "plot sheet",
    )?;

    if let (Some(path), Some(table)) = (&config.curve_fit_output, &run.curve_fit_table) {
        outputs.record(write_table_csv(path, table), path, "curve-fit sheet")?;
    }

    if let Some(path) = &config.summary_json {
        let summary = RunSummary::from_run(&run, config, outputs.written.clone());
        outputs.record(write_summary_json(path, &summary), path, "run summary")?;
    }

    outputs.finish()
}

/// Files written so far, and the ones skipped because they already existed.
#[derive(Default)]
struct Outputs {
    written: Vec<PathBuf>,
    collisions: Vec<AppError>,
}

impl Outputs {
    fn record(&mut self, result: Result<(), AppError>, path: &Path, what: &str) -> Result<(), AppError> {
        match result {
            Ok(()) => {
                println!("{}", crate::report::format_written(path, what));
                self.written.push(path.to_path_buf());
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::OutputCollision => {
                warn!("{err}");
                self.collisions.push(err);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn finish(mut self) -> Result<(), AppError> {
        match self.collisions.len() {
            0 => Ok(()),
            1 => Err(self.collisions.remove(0)),
            n => Err(AppError::new(
                ErrorKind::OutputCollision,
                format!("{n} output files already exist; they were left untouched."),
            )),
        }
    }
}

/// Build a run configuration from `process` flags.
pub fn config_from_args(args: &ProcessArgs, defaults: &Defaults) -> RunConfig {
    RunConfig {
        input_path: args.input.clone(),
        normalize_to_reference: args.reference,
        subtract_background: args.background,
        pace: args.pace.unwrap_or(defaults.pace),
        plot_output: output_path(&args.output),
        curve_fit_output: args.curve_fit.as_deref().map(output_path),
        summary_json: args.summary_json.clone(),
        plot: args.display.plot,
        plot_width: args.display.width,
        plot_height: args.display.height,
    }
}

/// Rewrite argv so `frap` defaults to a subcommand.
///
/// Rules:
/// - `frap`                       -> `frap interactive`
/// - `frap -f data.csv ...`       -> `frap process -f data.csv ...`
/// - `frap --plot`                -> `frap interactive --plot`
/// - `frap --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("interactive".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "process" | "interactive");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        let names_input = argv[1..]
            .iter()
            .any(|a| a.starts_with("-f") || a == "--input" || a.starts_with("--input="));
        let sub = if names_input { "process" } else { "interactive" };
        argv.insert(1, sub.to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_is_interactive() {
        assert_eq!(rewrite_args(argv(&["frap"])), argv(&["frap", "interactive"]));
        assert_eq!(
            rewrite_args(argv(&["frap", "--plot"])),
            argv(&["frap", "interactive", "--plot"])
        );
    }

    #[test]
    fn input_flag_selects_process() {
        assert_eq!(
            rewrite_args(argv(&["frap", "--reference", "-f", "a.csv"])),
            argv(&["frap", "process", "--reference", "-f", "a.csv"])
        );
        assert_eq!(
            rewrite_args(argv(&["frap", "--input=a.csv"])),
            argv(&["frap", "process", "--input=a.csv"])
        );
    }

    #[test]
    fn help_and_subcommands_unchanged() {
        assert_eq!(rewrite_args(argv(&["frap", "--help"])), argv(&["frap", "--help"]));
        assert_eq!(
            rewrite_args(argv(&["frap", "process", "-f", "a.csv"])),
            argv(&["frap", "process", "-f", "a.csv"])
        );
    }

    #[test]
    fn process_flags_become_config() {
        let cli = crate::cli::Cli::parse_from(["frap", "process", "-f", "in.csv", "-o", "out", "--curve-fit", "fit"]);
        let Command::Process(args) = cli.command else {
            panic!("expected process");
        };
        let config = config_from_args(&args, &Defaults { pace: 4 });

        assert_eq!(config.pace, 4);
        assert_eq!(config.plot_output, PathBuf::from("out.csv"));
        assert_eq!(config.curve_fit_output, Some(PathBuf::from("fit.csv")));
        assert!(!config.normalize_to_reference);
    }
}
