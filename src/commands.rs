//! Command implementations for tabcompare CLI

use crate::batch::{default_workers, run_batch};
use crate::cli::{Commands, OutputFormat, ToleranceArg};
use crate::config::BatchConfig;
use crate::engine::{compare, ComparisonJob};
use crate::error::{CompareError, Result};
use crate::loader::{DataLoader, SourceOptions};
use crate::progress::ProgressReporter;
use crate::reconcile::ReferenceKey;
use crate::report::{JsonFormatter, PrettyPrinter};
use std::path::{Path, PathBuf};

/// Execute a command
pub fn execute_command(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            config,
            workers,
            output,
            quiet,
        } => run_command(&config, workers, output, quiet),
        Commands::Compare {
            left,
            right,
            keys,
            tolerances,
            default_tolerances,
            ignore,
            count_difference,
            separator,
            no_header,
            format,
            output,
            limit,
        } => {
            let mut job = ComparisonJob::new(compare_name(&left, &right), ReferenceKey::new(keys)?);
            for ToleranceArg { name, tolerance, mode } in tolerances {
                job = job.with_tolerance(name, tolerance, mode);
            }
            for ToleranceArg { name, tolerance, mode } in default_tolerances {
                job = job.with_default(name, tolerance, mode);
            }
            job.ignore = ignore;
            job.count_difference = count_difference;

            let options = SourceOptions {
                separator,
                header: !no_header,
                ..SourceOptions::default()
            };
            compare_command(&left, &right, &job, &options, &format, output.as_deref(), limit)
        }
    }
}

/// Run a batch configuration
fn run_command(config_path: &Path, workers: Option<usize>, output: Option<PathBuf>, quiet: bool) -> Result<()> {
    let mut config = BatchConfig::from_file(config_path)?;
    if let Some(output) = output {
        config.output = output;
    }

    let mut progress = if quiet {
        ProgressReporter::new_minimal()
    } else {
        ProgressReporter::new_for_batch(config.comparisons.len() as u64)
    };

    let summary = run_batch(&config, workers.unwrap_or_else(default_workers), &progress)?;
    progress.finish("Batch complete");

    if summary.failed() > 0 {
        log::warn!("{} of {} comparisons failed", summary.failed(), summary.outcomes.len());
    }
    if !quiet {
        PrettyPrinter::print_batch_summary(&summary);
    }
    Ok(())
}

/// Compare two files and print or write the report
fn compare_command(
    left: &Path,
    right: &Path,
    job: &ComparisonJob,
    options: &SourceOptions,
    format: &str,
    output: Option<&Path>,
    limit: Option<usize>,
) -> Result<()> {
    let format = OutputFormat::parse(format).map_err(CompareError::invalid_input)?;

    let loader = DataLoader::new()?;
    let left_data = loader.load(left, options)?;
    let right_data = loader.load(right, options)?;

    let result = compare(&left_data, &right_data, job)?;

    match (format, output) {
        (OutputFormat::Json, Some(path)) => {
            std::fs::write(path, JsonFormatter::format_comparison(&result, limit)?)?;
            println!("✅ Report written to {}", path.display());
        }
        (OutputFormat::Json, None) => {
            println!("{}", JsonFormatter::format_comparison(&result, limit)?);
        }
        (OutputFormat::Pretty, Some(path)) => {
            std::fs::write(path, PrettyPrinter::render_comparison(&result, limit))?;
            println!("✅ Report written to {}", path.display());
        }
        (OutputFormat::Pretty, None) => PrettyPrinter::print_comparison(&result, limit),
    }

    Ok(())
}

fn compare_name(left: &Path, right: &Path) -> String {
    let stem = |p: &Path| {
        p.file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| p.display().to_string())
    };
    format!("{} vs {}", stem(left), stem(right))
}
