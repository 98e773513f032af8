//! Cell-level difference detection for one column at a time

use crate::reconcile::MergedView;
use crate::tolerance::ToleranceRule;
use crate::value::{CellValue, ValueKind};

/// Verdict for one (left, right) cell pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellOutcome {
    /// Exactly equal, including both sides null. Not counted as a difference.
    Equal,
    /// Different, but numerically inside the column's tolerance
    WithinTolerance,
    /// A reportable difference
    Different,
}

impl CellOutcome {
    pub fn is_difference(&self) -> bool {
        !matches!(self, Self::Equal)
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Different)
    }
}

/// Compare one cell pair.
///
/// Only numeric pairs with a tolerance rule can be equal within tolerance.
/// Strings, nulls and mixed pairs fall back to exact equality.
pub fn compare_cells(left: &CellValue, right: &CellValue, rule: Option<&ToleranceRule>) -> CellOutcome {
    if left == right {
        return CellOutcome::Equal;
    }

    match (left.kind(), right.kind(), rule) {
        (ValueKind::Numeric, ValueKind::Numeric, Some(rule)) => {
            if let (CellValue::Integer(l), CellValue::Integer(r)) = (left, right) {
                return if rule.accepts_integers(*l, *r) {
                    CellOutcome::WithinTolerance
                } else {
                    CellOutcome::Different
                };
            }

            match (left.as_f64(), right.as_f64()) {
                (Some(l), Some(r)) if rule.accepts(l, r) => CellOutcome::WithinTolerance,
                _ => CellOutcome::Different,
            }
        }
        _ => CellOutcome::Different,
    }
}

/// Counters and per-row verdicts for one compared column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDiff {
    pub column: String,
    /// Cells that differ at all
    pub absolute: usize,
    /// Cells that differ but were accepted by the tolerance rule
    pub in_tolerance: usize,
    /// Verdict per merged row
    pub outcomes: Vec<CellOutcome>,
}

impl ColumnDiff {
    pub fn has_differences(&self) -> bool {
        self.absolute > 0
    }

    pub fn outstanding(&self) -> usize {
        self.absolute - self.in_tolerance
    }
}

/// Diff the value column at `column` across every merged row
pub fn diff_column(view: &MergedView, column: usize, rule: Option<&ToleranceRule>) -> ColumnDiff {
    let mut diff = ColumnDiff {
        column: view.value_columns[column].clone(),
        absolute: 0,
        in_tolerance: 0,
        outcomes: Vec::with_capacity(view.len()),
    };

    for row in &view.rows {
        let (left, right) = &row.values[column];
        let outcome = compare_cells(left, right, rule);

        if outcome.is_difference() {
            diff.absolute += 1;
        }
        if outcome == CellOutcome::WithinTolerance {
            diff.in_tolerance += 1;
        }
        diff.outcomes.push(outcome);
    }

    log::debug!(
        "Column '{}': {} differences, {} within tolerance",
        diff.column,
        diff.absolute,
        diff.in_tolerance
    );

    diff
}
