//! Command-line interface for tabcompare

use crate::tolerance::ToleranceMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tabcompare")]
#[command(about = "Reconcile two tabular datasets and report differences beyond tolerance")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every comparison of a JSON configuration file
    Run {
        /// Configuration file path
        config: PathBuf,

        /// Number of worker threads (defaults to the number of logical CPUs)
        #[arg(long, value_parser = validate_workers)]
        workers: Option<usize>,

        /// Override the configured output folder
        #[arg(long)]
        output: Option<PathBuf>,

        /// Suppress progress and summary output
        #[arg(long)]
        quiet: bool,
    },

    /// Compare two files directly
    Compare {
        /// Left (baseline) file
        left: PathBuf,

        /// Right (candidate) file
        right: PathBuf,

        /// Reference column, repeat for a composite key
        #[arg(long = "key", required = true)]
        keys: Vec<String>,

        /// Column tolerance: COLUMN=VALUE[:abs|rel]
        #[arg(long = "tolerance", value_parser = parse_tolerance_arg)]
        tolerances: Vec<ToleranceArg>,

        /// Default tolerance for columns fully matching a pattern: PATTERN=VALUE[:abs|rel]
        #[arg(long = "default-tolerance", value_parser = parse_tolerance_arg)]
        default_tolerances: Vec<ToleranceArg>,

        /// Column excluded from comparison
        #[arg(long = "ignore")]
        ignore: Vec<String>,

        /// Column whose numeric left - right delta is reported
        #[arg(long = "count-difference")]
        count_difference: Vec<String>,

        /// Field separator for delimited files
        #[arg(long, default_value = ",")]
        separator: char,

        /// Files have no header row; columns are named by position
        #[arg(long)]
        no_header: bool,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,

        /// Write the report to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Maximum number of difference rows to list
        #[arg(long)]
        limit: Option<usize>,
    },
}

/// A `NAME=VALUE[:MODE]` tolerance argument. The mode is kept as text and
/// validated when tolerances are resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ToleranceArg {
    pub name: String,
    pub tolerance: f64,
    pub mode: String,
}

pub fn parse_tolerance_arg(s: &str) -> Result<ToleranceArg, String> {
    let (name, rest) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("Invalid tolerance '{}'. Use NAME=VALUE[:abs|rel]", s))?;
    if name.is_empty() {
        return Err(format!("Missing column name in tolerance '{}'", s));
    }

    let (value, mode) = match rest.split_once(':') {
        Some((value, mode)) => (value, mode.to_string()),
        None => (rest, ToleranceMode::Absolute.to_string()),
    };
    let tolerance: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("Invalid tolerance value: '{}'", value))?;

    Ok(ToleranceArg {
        name: name.to_string(),
        tolerance,
        mode,
    })
}

/// Parse output format string
#[derive(Debug, Clone)]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {}. Use 'pretty' or 'json'", s)),
        }
    }
}

/// Log level filter for the `--verbose` flag
pub fn log_level(verbose: bool) -> log::LevelFilter {
    if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    }
}

/// Validate that the worker count is greater than 0
fn validate_workers(s: &str) -> Result<usize, String> {
    let workers: usize = s
        .parse()
        .map_err(|_| format!("Invalid worker count: '{}'. Must be a positive integer.", s))?;

    if workers == 0 {
        return Err("Worker count must be greater than 0".to_string());
    }

    Ok(workers)
}
