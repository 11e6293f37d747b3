//! Interactive question flow.
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the prompter walks a scientist through one run: pick a sheet, choose
//!   normalization, pace and output names
//!
//! The prompter is generic over its reader/writer so the flow can be tested
//! with in-memory buffers.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::cli::{Defaults, DisplayArgs};
use crate::domain::RunConfig;
use crate::error::{AppError, ErrorKind};
use crate::io::export::output_path;

/// Directory recursion depth when listing candidate input files.
const DEFAULT_SEARCH_DEPTH: usize = 1;

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn say(&mut self, text: &str) -> Result<(), AppError> {
        writeln!(self.output, "{text}").map_err(write_error)
    }

    /// Print `question` and read one trimmed line.
    pub fn ask(&mut self, question: &str) -> Result<String, AppError> {
        write!(self.output, "{question} ").map_err(write_error)?;
        self.output.flush().map_err(write_error)?;

        let mut line = String::new();
        let bytes = self
            .input
            .read_line(&mut line)
            .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to read input: {e}")))?;
        if bytes == 0 {
            return Err(AppError::new(
                ErrorKind::Usage,
                "No input received. Use `frap process -f <file.csv>` for non-interactive runs.",
            ));
        }
        Ok(line.trim().to_string())
    }

    /// Ask until the answer is yes or no.
    pub fn ask_yes_no(&mut self, question: &str) -> Result<bool, AppError> {
        loop {
            let answer = self.ask(&format!("{question} (yes/no)"))?;
            match answer.to_ascii_lowercase().as_str() {
                "yes" | "y" => return Ok(true),
                "no" | "n" => return Ok(false),
                _ => self.say("Please answer yes or no.")?,
            }
        }
    }

    /// Ask for the pace; an empty answer keeps `default`.
    pub fn ask_pace(&mut self, default: u32) -> Result<u32, AppError> {
        loop {
            let answer = self.ask(&format!("Time pace in seconds? (default {default})"))?;
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse::<u32>() {
                Ok(pace) if pace > 0 => return Ok(pace),
                _ => self.say("Pace must be a positive whole number of seconds.")?,
            }
        }
    }

    /// Ask for an output base name; an empty answer keeps `default`.
    pub fn ask_name(&mut self, question: &str, default: &str) -> Result<String, AppError> {
        let answer = self.ask(&format!("{question} (default {default})"))?;
        Ok(if answer.is_empty() { default.to_string() } else { answer })
    }

    /// Let the user pick one of `files` by number, or type a path.
    pub fn choose_input(&mut self, files: &[PathBuf]) -> Result<PathBuf, AppError> {
        if files.is_empty() {
            self.say("No .csv files found in the current directory.")?;
        } else {
            self.say(&format!("Found {} CSV file(s):", files.len()))?;
            for (idx, path) in files.iter().enumerate() {
                self.say(&format!("{:>3}) {}", idx + 1, pretty_path(path)))?;
            }
        }

        loop {
            let input = self.ask("Select a file by number or type a path (q to quit):")?;
            if input.eq_ignore_ascii_case("q") {
                return Err(AppError::new(ErrorKind::Usage, "Canceled."));
            }

            if let Ok(choice) = input.parse::<usize>() {
                if (1..=files.len()).contains(&choice) {
                    return Ok(files[choice - 1].clone());
                }
                self.say(&format!("Invalid choice: {choice}."))?;
                continue;
            }

            let candidate = PathBuf::from(&input);
            match validate_csv_path(&candidate) {
                Ok(path) => return Ok(path),
                Err(err) => self.say(&err.to_string())?,
            }
        }
    }
}

/// Run the full question sequence and return the resolved configuration.
pub fn prompt_run_config<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    files: &[PathBuf],
    defaults: &Defaults,
    display: &DisplayArgs,
) -> Result<RunConfig, AppError> {
    let input_path = prompter.choose_input(files)?;

    let normalize_to_reference = prompter
        .ask_yes_no("Normalize your data to the reference? (useful if unwanted bleaching is strong)")?;
    let subtract_background = if normalize_to_reference {
        prompter.ask_yes_no("Subtract background as well?")?
    } else {
        false
    };

    let pace = prompter.ask_pace(defaults.pace)?;
    let plot_name = prompter.ask_name("Name of the plot output file?", "frap_plot")?;

    let curve_fit_output = if prompter.ask_yes_no("Also generate the curve-fit sheet?")? {
        let name = prompter.ask_name("Name of the curve-fit output file?", "frap_curve_fit")?;
        Some(output_path(&name))
    } else {
        None
    };

    Ok(RunConfig {
        input_path,
        normalize_to_reference,
        subtract_background,
        pace,
        plot_output: output_path(&plot_name),
        curve_fit_output,
        summary_json: None,
        plot: display.plot,
        plot_width: display.width,
        plot_height: display.height,
    })
}

/// Validate the provided path points to an existing `.csv` file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::new(
            ErrorKind::InputNotFound,
            format!("CSV file not found: {}", path.display()),
        ));
    }
    if path.is_dir() {
        return Err(AppError::new(
            ErrorKind::Usage,
            format!("Expected a file, got a directory: {}", path.display()),
        ));
    }
    if !has_csv_extension(path) {
        return Err(AppError::new(
            ErrorKind::Usage,
            format!("Expected a .csv file (got: {}).", path.display()),
        ));
    }

    Ok(path.to_path_buf())
}

/// Discover `*.csv` files under the current directory (deterministic order).
pub fn discover_csv_files() -> Vec<PathBuf> {
    find_csv_files(Path::new("."), DEFAULT_SEARCH_DEPTH)
}

fn find_csv_files(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut out = Vec::new();
    find_csv_files_inner(root, 0, max_depth, &mut out);
    out.sort_by_key(|p| pretty_path(p));
    out
}

fn find_csv_files_inner(root: &Path, depth: usize, max_depth: usize, out: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }

    let Ok(entries) = fs::read_dir(root) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            if should_skip_dir(&path) {
                continue;
            }
            find_csv_files_inner(&path, depth + 1, max_depth, out);
        } else if file_type.is_file() && has_csv_extension(&path) {
            out.push(path);
        }
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        == Some(true)
}

fn should_skip_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    matches!(name, ".git" | "target" | "node_modules")
}

fn pretty_path(path: &Path) -> String {
    let stripped = path.strip_prefix("./").unwrap_or(path);
    stripped.display().to_string()
}

fn write_error(e: io::Error) -> AppError {
    AppError::new(ErrorKind::Io, format!("Failed to write prompt: {e}"))
}
