//! Folding per-column diffs into the final comparison result

use crate::differ::ColumnDiff;
use crate::reconcile::{JoinAnomaly, MergedRow, MergedView, Provenance, Reconciliation};
use crate::tolerance::ToleranceSet;
use crate::value::numeric_delta;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Per-column difference totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffCounter {
    pub absolute: usize,
    pub in_tolerance: usize,
}

/// Row counts per provenance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinStats {
    pub matched_both: usize,
    pub unmatched_left: usize,
    pub unmatched_right: usize,
}

impl JoinStats {
    pub fn from_rows(rows: &[MergedRow]) -> Self {
        rows.iter().fold(Self::default(), |mut stats, row| {
            match row.provenance {
                Provenance::Both => stats.matched_both += 1,
                Provenance::LeftOnly => stats.unmatched_left += 1,
                Provenance::RightOnly => stats.unmatched_right += 1,
            }
            stats
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineCounts {
    pub left: usize,
    pub right: usize,
    pub merged: usize,
}

/// A merged row that still holds at least one out-of-tolerance cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferenceRow {
    /// Index into [`ComparisonResult::merged`]
    pub row: usize,
    /// Columns whose cell remains different in this row
    pub columns: Vec<String>,
    /// `|left - right|` for every count-difference column, 0 when either side
    /// is not numeric
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub deltas: IndexMap<String, f64>,
}

/// Outcome of one comparison job, handed to the reporter as-is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub name: String,
    pub column_names: Vec<String>,
    pub merged: MergedView,
    pub differences: Vec<DifferenceRow>,
    /// Compared columns with at least one difference, in schema order
    pub diff_column_names: Vec<String>,
    pub diffs_counter: IndexMap<String, DiffCounter>,
    pub join: JoinStats,
    pub lines: LineCounts,
    pub tolerances: ToleranceSet,
    pub note: Option<String>,
    pub anomaly: Option<JoinAnomaly>,
    pub elapsed_secs: f64,
}

impl ComparisonResult {
    /// True when every compared cell matched, possibly within tolerance
    pub fn is_clean(&self) -> bool {
        self.differences.is_empty()
    }

    pub fn difference_rows(&self) -> impl Iterator<Item = (&DifferenceRow, &MergedRow)> {
        self.differences
            .iter()
            .filter_map(move |d| self.merged.rows.get(d.row).map(|row| (d, row)))
    }
}

/// Everything the aggregator needs besides the column diffs
pub struct AggregateInput<'a> {
    pub name: &'a str,
    pub columns: &'a [String],
    pub lines: LineCounts,
    pub tolerances: ToleranceSet,
    pub count_difference: &'a [String],
}

/// Combine per-column diffs into a [`ComparisonResult`].
///
/// Depends only on the merged rows and the column diffs, so the order in
/// which columns were diffed does not matter.
pub fn aggregate(input: AggregateInput<'_>, reconciliation: Reconciliation, column_diffs: Vec<ColumnDiff>) -> ComparisonResult {
    let Reconciliation { view, empty, anomaly } = reconciliation;

    let mut column_diffs = column_diffs;
    column_diffs.sort_by_key(|d| view.value_index(&d.column).unwrap_or(usize::MAX));

    let diffs_counter: IndexMap<String, DiffCounter> = column_diffs
        .iter()
        .map(|d| {
            (
                d.column.clone(),
                DiffCounter {
                    absolute: d.absolute,
                    in_tolerance: d.in_tolerance,
                },
            )
        })
        .collect();

    let diff_column_names: Vec<String> = column_diffs
        .iter()
        .filter(|d| d.has_differences())
        .map(|d| d.column.clone())
        .collect();

    let count_indexes: Vec<(String, usize)> = input
        .count_difference
        .iter()
        .filter_map(|c| view.value_index(c).map(|i| (c.clone(), i)))
        .collect();

    let mut raw_rows = 0usize;
    let mut differences = Vec::new();
    for (i, row) in view.rows.iter().enumerate() {
        let any_difference = column_diffs.iter().any(|d| d.outcomes[i].is_difference());
        if !any_difference {
            continue;
        }
        raw_rows += 1;

        let columns: Vec<String> = column_diffs
            .iter()
            .filter(|d| !d.outcomes[i].is_resolved())
            .map(|d| d.column.clone())
            .collect();
        if columns.is_empty() {
            continue;
        }

        let deltas = count_indexes
            .iter()
            .map(|(name, idx)| {
                let (left, right) = &row.values[*idx];
                let delta = numeric_delta(left, right).map_or(0.0, f64::abs);
                (name.clone(), delta)
            })
            .collect();

        differences.push(DifferenceRow { row: i, columns, deltas });
    }

    if raw_rows > 0 {
        let eliminated = raw_rows - differences.len();
        log::info!(
            "By applying the tolerances, {} ({:.2}%) differences were deleted",
            eliminated,
            eliminated as f64 / raw_rows as f64 * 100.0
        );
    }

    let join = JoinStats::from_rows(&view.rows);
    let lines = LineCounts {
        merged: view.len(),
        ..input.lines
    };

    ComparisonResult {
        name: input.name.to_string(),
        column_names: input.columns.to_vec(),
        merged: view,
        differences,
        diff_column_names,
        diffs_counter,
        join,
        lines,
        tolerances: input.tolerances,
        note: empty.map(|e| e.note().to_string()),
        anomaly,
        elapsed_secs: 0.0,
    }
}
