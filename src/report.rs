//! Output formatting utilities

use crate::aggregate::{ComparisonResult, DifferenceRow};
use crate::batch::{BatchSummary, JobOutcome};
use crate::error::Result;
use crate::reconcile::MergedRow;
use crate::tolerance::RuleSource;
use serde_json::{json, Map, Value};
use std::fmt::Write;

/// Pretty printer for comparison output
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Print one comparison result, listing at most `limit` difference rows
    pub fn print_comparison(result: &ComparisonResult, limit: Option<usize>) {
        print!("{}", Self::render_comparison(result, limit));
    }

    pub fn print_batch_summary(summary: &BatchSummary) {
        print!("{}", Self::render_batch_summary(summary));
    }

    pub fn render_comparison(result: &ComparisonResult, limit: Option<usize>) -> String {
        let mut out = String::new();
        let lines = &result.lines;
        let join = &result.join;

        let _ = writeln!(out, "🔍 Comparison: {}", result.name);
        let _ = writeln!(
            out,
            "├─ Lines: left {}, right {}, merged {}",
            lines.left, lines.right, lines.merged
        );
        let _ = writeln!(
            out,
            "├─ Join: {} matched, {} left only, {} right only",
            join.matched_both, join.unmatched_left, join.unmatched_right
        );
        if let Some(anomaly) = &result.anomaly {
            let _ = writeln!(
                out,
                "├─ ⚠️  Join anomaly: {} merged rows from {} left and {} right rows",
                anomaly.merged_rows, anomaly.left_rows, anomaly.right_rows
            );
        }
        if let Some(note) = &result.note {
            let _ = writeln!(out, "├─ Note: {}", note);
        }

        if !result.tolerances.is_empty() {
            let _ = writeln!(out, "├─ Tolerances:");
            let count = result.tolerances.len();
            for (i, (column, rule)) in result.tolerances.iter().enumerate() {
                let source = match &rule.source {
                    RuleSource::Explicit => "explicit".to_string(),
                    RuleSource::Default(pattern) => format!("default '{}'", pattern),
                };
                let _ = writeln!(
                    out,
                    "│  {} {}: {} {} ({})",
                    branch(i, count),
                    column,
                    rule.tolerance,
                    rule.mode,
                    source
                );
            }
        }

        let differing: Vec<_> = result
            .diffs_counter
            .iter()
            .filter(|(_, counter)| counter.absolute > 0)
            .collect();
        if differing.is_empty() {
            let _ = writeln!(out, "├─ ✅ Columns: no differences");
        } else {
            let _ = writeln!(out, "├─ Column differences:");
            for (i, (column, counter)) in differing.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "│  {} {}: {} differences, {} within tolerance",
                    branch(i, differing.len()),
                    column,
                    counter.absolute,
                    counter.in_tolerance
                );
            }
        }

        if result.is_clean() {
            let _ = writeln!(out, "├─ ✅ Rows: no differences beyond tolerance");
        } else {
            let total = result.differences.len();
            let shown = limit.unwrap_or(total).min(total);
            let _ = writeln!(out, "├─ ❌ Rows with differences: {}", total);
            for (i, (diff, row)) in result.difference_rows().take(shown).enumerate() {
                let last = i + 1 == shown && shown == total;
                let _ = writeln!(
                    out,
                    "│  {} {} ({}): {}",
                    if last { "└─" } else { "├─" },
                    describe_key(&result.merged.key_columns, row),
                    row.provenance,
                    describe_cells(result, diff, row)
                );
            }
            if shown < total {
                let _ = writeln!(out, "│  └─ ... and {} more", total - shown);
            }
        }

        let _ = writeln!(out, "└─ Elapsed: {:.2}s", result.elapsed_secs);
        out
    }

    pub fn render_batch_summary(summary: &BatchSummary) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "📊 Batch: {} comparisons", summary.outcomes.len());
        let _ = writeln!(
            out,
            "├─ Completed: {}, skipped: {}, failed: {}",
            summary.completed(),
            summary.skipped(),
            summary.failed()
        );
        let _ = writeln!(out, "├─ Output: {}", summary.output.display());

        for outcome in &summary.outcomes {
            let line = match outcome {
                JobOutcome::Completed { summary } if summary.rows_with_differences == 0 => {
                    format!("✅ {}: no differences", summary.name)
                }
                JobOutcome::Completed { summary } => format!(
                    "❌ {}: {} rows with differences in [{}]",
                    summary.name,
                    summary.rows_with_differences,
                    summary.diff_column_names.join(", ")
                ),
                JobOutcome::Skipped { name } => format!("⏭️  {}: skipped", name),
                JobOutcome::Failed { name, error } => format!("💥 {}: {}", name, error),
            };
            let _ = writeln!(out, "├─ {}", line);
        }

        let _ = writeln!(out, "└─ Elapsed: {:.2}s", summary.elapsed_secs);
        out
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format any serializable data as JSON
    pub fn format<T: serde::Serialize + ?Sized>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }

    /// Format a comparison as a report: counters plus the retained difference
    /// rows with their key and cell values, capped at `limit` rows
    pub fn format_comparison(result: &ComparisonResult, limit: Option<usize>) -> Result<String> {
        let total = result.differences.len();
        let shown = limit.unwrap_or(total).min(total);

        let rows: Vec<Value> = result
            .difference_rows()
            .take(shown)
            .map(|(diff, row)| difference_json(result, diff, row))
            .collect();

        let report = json!({
            "name": result.name,
            "column_names": result.column_names,
            "lines": result.lines,
            "join": result.join,
            "diffs_counter": result.diffs_counter,
            "diff_column_names": result.diff_column_names,
            "tolerances": result.tolerances,
            "note": result.note,
            "anomaly": result.anomaly,
            "elapsed_secs": result.elapsed_secs,
            "rows_with_differences": total,
            "truncated": shown < total,
            "differences": rows,
        });
        Ok(serde_json::to_string_pretty(&report)?)
    }
}

fn difference_json(result: &ComparisonResult, diff: &DifferenceRow, row: &MergedRow) -> Value {
    let key: Map<String, Value> = result
        .merged
        .key_columns
        .iter()
        .zip(&row.key)
        .map(|(column, value)| (column.clone(), json!(value)))
        .collect();

    let cells: Map<String, Value> = diff
        .columns
        .iter()
        .filter_map(|column| {
            let (left, right) = &row.values[result.merged.value_index(column)?];
            Some((column.clone(), json!({ "left": left, "right": right })))
        })
        .collect();

    json!({
        "key": key,
        "provenance": row.provenance,
        "columns": cells,
        "deltas": diff.deltas,
    })
}

fn describe_key(key_columns: &[String], row: &MergedRow) -> String {
    key_columns
        .iter()
        .zip(&row.key)
        .map(|(column, value)| format!("{}={}", column, value))
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_cells(result: &ComparisonResult, diff: &DifferenceRow, row: &MergedRow) -> String {
    diff.columns
        .iter()
        .filter_map(|column| {
            let (left, right) = &row.values[result.merged.value_index(column)?];
            let mut cell = format!("{} '{}' → '{}'", column, left, right);
            if let Some(delta) = diff.deltas.get(column) {
                let _ = write!(cell, " (Δ {})", delta);
            }
            Some(cell)
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn branch(index: usize, count: usize) -> &'static str {
    if index + 1 == count {
        "└─"
    } else {
        "├─"
    }
}
