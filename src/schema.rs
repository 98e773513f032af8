//! Positional schema validation

use crate::dataset::Dataset;
use crate::error::{CompareError, Result};

/// Check that both datasets expose the same columns in the same order.
/// Returns the shared column list.
pub fn validate_schema(left: &Dataset, right: &Dataset) -> Result<Vec<String>> {
    let (left_columns, right_columns) = (left.columns(), right.columns());

    if left_columns.len() != right_columns.len() {
        log::error!(
            "No. of columns differs: left = {}, right = {}",
            left_columns.len(),
            right_columns.len()
        );
        return Err(CompareError::ColumnCountMismatch {
            left: left_columns.len(),
            right: right_columns.len(),
        });
    }

    if let Some((position, (l, r))) = left_columns
        .iter()
        .zip(right_columns)
        .enumerate()
        .find(|(_, (l, r))| l != r)
    {
        log::error!(
            "Column names at position {} differ: left = '{}', right = '{}'",
            position,
            l,
            r
        );
        return Err(CompareError::SchemaMismatch {
            position,
            left: l.clone(),
            right: r.clone(),
        });
    }

    Ok(left_columns.to_vec())
}
