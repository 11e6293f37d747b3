//! Command-line parsing for the FRAP processor.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the processing code.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use log::warn;

use crate::series::DEFAULT_PACE;

pub mod prompt;

/// Environment variable holding the default pace (seconds).
pub const PACE_ENV: &str = "FRAP_PACE";

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "frap",
    version,
    about = "FRAP recovery processing: resample replicate curves, align them and compute mean ± SEM"
)]
pub struct Cli {
    /// More log output (-v info, -vv debug). `RUST_LOG` overrides this.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Process a sheet with all options given as flags.
    Process(ProcessArgs),
    /// Ask for the input file and options interactively (default when no arguments are given).
    Interactive(DisplayArgs),
}

/// Options for a scripted run.
#[derive(Debug, Clone, Parser)]
pub struct ProcessArgs {
    /// Input CSV exported from the imaging software.
    #[arg(short = 'f', long, value_name = "CSV")]
    pub input: PathBuf,

    /// Normalize channels to the reference region (`ref_N`).
    #[arg(long)]
    pub reference: bool,

    /// Subtract background (`back_N`) before the reference ratio (requires --reference).
    #[arg(long, requires = "reference")]
    pub background: bool,

    /// Resampling bin width in seconds (default: $FRAP_PACE or 1).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub pace: Option<u32>,

    /// Base name of the plot sheet (`.csv` is appended).
    #[arg(short = 'o', long, default_value = "frap_plot")]
    pub output: String,

    /// Also write the curve-fit sheet under this base name.
    #[arg(long = "curve-fit", value_name = "NAME")]
    pub curve_fit: Option<String>,

    /// Write a JSON summary of the run.
    #[arg(long = "summary-json", value_name = "JSON")]
    pub summary_json: Option<PathBuf>,

    #[command(flatten)]
    pub display: DisplayArgs,
}

/// Terminal output options shared by both modes.
#[derive(Debug, Clone, Args)]
pub struct DisplayArgs {
    /// Render the mean recovery curves in the terminal.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

/// Defaults that can be set through the environment (or a `.env` file).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Defaults {
    pub pace: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self { pace: DEFAULT_PACE }
    }
}

impl Defaults {
    /// Load defaults from `.env` / process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_pace_var(std::env::var(PACE_ENV).ok().as_deref())
    }

    fn from_pace_var(value: Option<&str>) -> Self {
        let Some(raw) = value else {
            return Self::default();
        };
        match raw.trim().parse::<u32>() {
            Ok(pace) if pace > 0 => Self { pace },
            _ => {
                warn!("ignoring {PACE_ENV}='{raw}' (expected a positive integer)");
                Self::default()
            }
        }
    }
}
