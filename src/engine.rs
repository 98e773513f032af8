//! The comparison pipeline: schema check, join, tolerance resolution,
//! per-column diffing and aggregation, run sequentially over one pair of
//! datasets.

use crate::aggregate::{aggregate, AggregateInput, ComparisonResult, LineCounts};
use crate::dataset::Dataset;
use crate::differ::diff_column;
use crate::error::{CompareError, Result};
use crate::reconcile::{reconcile, ReferenceKey};
use crate::schema::validate_schema;
use crate::tolerance::{resolve_tolerances, ColumnTolerance, DefaultTolerance};
use std::time::Instant;

/// Everything a single comparison needs besides the two datasets
#[derive(Debug, Clone)]
pub struct ComparisonJob {
    pub name: String,
    pub key: ReferenceKey,
    pub tolerances: Vec<ColumnTolerance>,
    pub defaults: Vec<DefaultTolerance>,
    /// Validated as part of the schema but never diffed
    pub ignore: Vec<String>,
    /// Columns whose numeric `left - right` delta is reported per retained row
    pub count_difference: Vec<String>,
}

impl ComparisonJob {
    pub fn new(name: impl Into<String>, key: ReferenceKey) -> Self {
        Self {
            name: name.into(),
            key,
            tolerances: Vec::new(),
            defaults: Vec::new(),
            ignore: Vec::new(),
            count_difference: Vec::new(),
        }
    }

    pub fn with_tolerance(mut self, column: impl Into<String>, tolerance: f64, mode: impl Into<String>) -> Self {
        self.tolerances.push(ColumnTolerance::new(column, tolerance, mode));
        self
    }

    pub fn with_default(mut self, pattern: impl Into<String>, tolerance: f64, mode: impl Into<String>) -> Self {
        self.defaults.push(DefaultTolerance::new(pattern, tolerance, mode));
        self
    }

    pub fn with_ignored(mut self, column: impl Into<String>) -> Self {
        self.ignore.push(column.into());
        self
    }

    pub fn with_count_difference(mut self, column: impl Into<String>) -> Self {
        self.count_difference.push(column.into());
        self
    }

    fn is_compared(&self, column: &str) -> bool {
        !self.key.contains(column) && !self.ignore.iter().any(|c| c == column)
    }
}

/// Compare `left` against `right` under `job`.
///
/// Fails on schema mismatch, unknown key or configured columns, and invalid
/// tolerance rules. Empty inputs and join anomalies are reported in the
/// result instead.
pub fn compare(left: &Dataset, right: &Dataset, job: &ComparisonJob) -> Result<ComparisonResult> {
    let start = Instant::now();
    log::info!("Starting comparison '{}'", job.name);

    let columns = validate_schema(left, right)?;
    check_configured_columns(job, &columns)?;

    let reconciliation = reconcile(left, right, &job.key)?;

    // resolved even when an input is empty so configuration errors still surface
    let tolerances = resolve_tolerances(&job.tolerances, &job.defaults, &columns, job.key.columns())?;

    let diff_start = Instant::now();
    let view = &reconciliation.view;
    let column_diffs = if view.is_empty() {
        Vec::new()
    } else {
        view.value_columns
            .iter()
            .enumerate()
            .filter(|(_, name)| job.is_compared(name))
            .map(|(i, name)| diff_column(view, i, tolerances.get(name)))
            .collect()
    };
    log::info!(
        "Comparing columns finished, elapsed time: {:.2}s",
        diff_start.elapsed().as_secs_f64()
    );

    let lines = LineCounts {
        left: left.len(),
        right: right.len(),
        merged: 0,
    };
    let mut result = aggregate(
        AggregateInput {
            name: &job.name,
            columns: &columns,
            lines,
            tolerances,
            count_difference: &job.count_difference,
        },
        reconciliation,
        column_diffs,
    );
    result.elapsed_secs = start.elapsed().as_secs_f64();

    log::info!(
        "Comparison '{}' finished: {} rows with differences, elapsed time: {:.2}s",
        job.name,
        result.differences.len(),
        result.elapsed_secs
    );

    Ok(result)
}

fn check_configured_columns(job: &ComparisonJob, columns: &[String]) -> Result<()> {
    let configured = job
        .ignore
        .iter()
        .chain(&job.count_difference)
        .chain(job.tolerances.iter().map(|t| &t.column));

    for column in configured {
        if !columns.contains(column) {
            log::error!("Configured column '{}' is not part of the schema", column);
            return Err(CompareError::config(format!(
                "Column '{}' is not part of the schema of job '{}'",
                column, job.name
            )));
        }
    }
    Ok(())
}
