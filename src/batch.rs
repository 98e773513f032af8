//! Running many comparisons on a fixed-size worker pool

use crate::aggregate::{JoinStats, LineCounts};
use crate::config::{BatchConfig, JobConfig};
use crate::engine::compare;
use crate::error::{CompareError, Result};
use crate::loader::DataLoader;
use crate::progress::ProgressReporter;
use crate::report::JsonFormatter;
use crate::tolerance::DefaultTolerance;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub const SUMMARY_FILE: &str = "summary.json";

/// Short account of one finished comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub name: String,
    pub report: PathBuf,
    pub rows_with_differences: usize,
    pub diff_column_names: Vec<String>,
    pub join: JoinStats,
    pub lines: LineCounts,
    pub note: Option<String>,
    pub join_anomaly: bool,
    pub elapsed_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    Completed { summary: JobSummary },
    Skipped { name: String },
    Failed { name: String, error: String },
}

impl JobOutcome {
    pub fn name(&self) -> &str {
        match self {
            Self::Completed { summary } => &summary.name,
            Self::Skipped { name } | Self::Failed { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub started: DateTime<Utc>,
    pub output: PathBuf,
    pub workers: usize,
    /// One entry per configured comparison, in configuration order
    pub outcomes: Vec<JobOutcome>,
    pub elapsed_secs: f64,
}

impl BatchSummary {
    pub fn completed(&self) -> usize {
        self.count(|o| matches!(o, JobOutcome::Completed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, JobOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, JobOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&JobOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Default worker count: one per logical CPU
pub fn default_workers() -> usize {
    rayon::current_num_threads()
}

/// Run every comparison of `config` on a pool of `workers` threads.
///
/// Reports go to a fresh timestamped folder under `config.output`. A failing
/// comparison is recorded in the summary and never stops the others.
pub fn run_batch(config: &BatchConfig, workers: usize, progress: &ProgressReporter) -> Result<BatchSummary> {
    let start = Instant::now();
    let started = Utc::now();
    let workers = workers.max(1);

    let folder = config.output.join(started.format("%Y%m%d_%H%M%S").to_string());
    fs::create_dir_all(&folder)?;
    log::info!(
        "Running {} comparisons on {} workers, output in {}",
        config.comparisons.len(),
        workers,
        folder.display()
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| CompareError::config(format!("Cannot start worker pool: {}", e)))?;

    let outcomes: Vec<JobOutcome> = pool.install(|| {
        config
            .comparisons
            .par_iter()
            .map(|job| {
                let outcome = run_job(job, &config.defaults.tolerances, &folder);
                progress.job_finished(outcome.name());
                outcome
            })
            .collect()
    });

    let summary = BatchSummary {
        started,
        output: folder,
        workers,
        outcomes,
        elapsed_secs: start.elapsed().as_secs_f64(),
    };

    fs::write(summary.output.join(SUMMARY_FILE), JsonFormatter::format(&summary)?)?;
    log::info!(
        "Batch finished: {} completed, {} skipped, {} failed, elapsed time: {:.2}s",
        summary.completed(),
        summary.skipped(),
        summary.failed(),
        summary.elapsed_secs
    );

    Ok(summary)
}

fn run_job(job: &JobConfig, defaults: &[DefaultTolerance], folder: &Path) -> JobOutcome {
    if !job.enabled {
        log::info!("Comparison '{}' is disabled, skipping", job.name);
        return JobOutcome::Skipped { name: job.name.clone() };
    }

    match compare_and_write(job, defaults, folder) {
        Ok(summary) => JobOutcome::Completed { summary },
        Err(e) => {
            let error = CompareError::job(&job.name, e);
            log::error!("{}", error);
            JobOutcome::Failed {
                name: job.name.clone(),
                error: error.to_string(),
            }
        }
    }
}

fn compare_and_write(job: &JobConfig, defaults: &[DefaultTolerance], folder: &Path) -> Result<JobSummary> {
    job.validate()?;
    let comparison = job.to_job(defaults)?;

    let loader = DataLoader::new()?;
    let options = job.source_options();
    let left = loader.load(&job.left, &options)?;
    let right = loader.load(&job.right, &options)?;

    let result = compare(&left, &right, &comparison)?;

    let report = folder.join(report_file_name(&job.name));
    fs::write(&report, JsonFormatter::format_comparison(&result, None)?)?;

    Ok(JobSummary {
        name: result.name.clone(),
        report,
        rows_with_differences: result.differences.len(),
        diff_column_names: result.diff_column_names.clone(),
        join: result.join,
        lines: result.lines,
        note: result.note.clone(),
        join_anomaly: result.anomaly.is_some(),
        elapsed_secs: result.elapsed_secs,
    })
}

/// File name for a job's report, with path-hostile characters replaced
pub fn report_file_name(job: &str) -> String {
    let safe: String = job
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{}.json", safe)
}
