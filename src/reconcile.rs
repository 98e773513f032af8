//! Key-based outer join of two datasets

use crate::dataset::Dataset;
use crate::error::{CompareError, Result};
use crate::value::CellValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

/// Ordered, non-empty list of columns aligning rows between two datasets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ReferenceKey(Vec<String>);

impl ReferenceKey {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Result<Self> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(CompareError::config("At least one reference column is required"));
        }
        Ok(Self(columns))
    }

    pub fn columns(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.iter().any(|c| c == column)
    }

    /// Positions of the key columns in `dataset`
    fn resolve(&self, dataset: &Dataset) -> Result<Vec<usize>> {
        self.0
            .iter()
            .map(|column| {
                dataset.column_index(column).ok_or_else(|| {
                    log::error!("Reference column '{}' is not part of the schema", column);
                    CompareError::MissingKeyColumn {
                        column: column.clone(),
                    }
                })
            })
            .collect()
    }
}

impl TryFrom<Vec<String>> for ReferenceKey {
    type Error = CompareError;

    fn try_from(columns: Vec<String>) -> Result<Self> {
        Self::new(columns)
    }
}

impl From<ReferenceKey> for Vec<String> {
    fn from(key: ReferenceKey) -> Self {
        key.0
    }
}

/// Which side(s) a merged row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Both,
    LeftOnly,
    RightOnly,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Both => write!(f, "both"),
            Self::LeftOnly => write!(f, "left_only"),
            Self::RightOnly => write!(f, "right_only"),
        }
    }
}

/// One row of the outer join. `values[i]` pairs the left and right cell of
/// the i-th value column; the missing side of a one-sided row is null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRow {
    pub key: Vec<CellValue>,
    pub provenance: Provenance,
    pub values: Vec<(CellValue, CellValue)>,
}

/// The row-aligned merged view, sorted by key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedView {
    pub key_columns: Vec<String>,
    /// Every non-key column, in schema order
    pub value_columns: Vec<String>,
    pub rows: Vec<MergedRow>,
}

impl MergedView {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn value_index(&self, column: &str) -> Option<usize> {
        self.value_columns.iter().position(|c| c == column)
    }
}

/// Which input was empty when the join was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyInput {
    Both,
    Left,
    Right,
}

impl EmptyInput {
    pub fn note(&self) -> &'static str {
        match self {
            Self::Both => "Left and right datasets are empty and will not be compared",
            Self::Left => "Left dataset is empty and will not be compared in detail",
            Self::Right => "Right dataset is empty and will not be compared in detail",
        }
    }
}

/// Merged row count diverged from the larger input, usually duplicate keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinAnomaly {
    pub left_rows: usize,
    pub right_rows: usize,
    pub merged_rows: usize,
}

#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub view: MergedView,
    pub empty: Option<EmptyInput>,
    pub anomaly: Option<JoinAnomaly>,
}

/// Full outer join of `left` and `right` on `key`.
///
/// Both datasets must already share one schema. Keys repeated on one side fan
/// out against every match on the other side.
pub fn reconcile(left: &Dataset, right: &Dataset, key: &ReferenceKey) -> Result<Reconciliation> {
    let key_indexes = key.resolve(left)?;
    let value_indexes: Vec<usize> = (0..left.columns().len())
        .filter(|i| !key_indexes.contains(i))
        .collect();

    let mut view = MergedView {
        key_columns: key.columns().to_vec(),
        value_columns: value_indexes.iter().map(|&i| left.columns()[i].clone()).collect(),
        rows: Vec::new(),
    };

    let empty = match (left.is_empty(), right.is_empty()) {
        (true, true) => Some(EmptyInput::Both),
        (true, false) => Some(EmptyInput::Left),
        (false, true) => Some(EmptyInput::Right),
        (false, false) => None,
    };
    if let Some(empty) = empty {
        log::info!("{}", empty.note());
        return Ok(Reconciliation {
            view,
            empty: Some(empty),
            anomaly: None,
        });
    }

    log::info!("The number of lines in the left dataset is {}", left.len());
    log::info!("The number of lines in the right dataset is {}", right.len());

    let start = Instant::now();
    let mut groups: BTreeMap<Vec<CellValue>, (Vec<usize>, Vec<usize>)> = BTreeMap::new();
    for (i, row) in left.rows().iter().enumerate() {
        groups.entry(key_of(row, &key_indexes)).or_default().0.push(i);
    }
    for (i, row) in right.rows().iter().enumerate() {
        groups.entry(key_of(row, &key_indexes)).or_default().1.push(i);
    }

    for (key_values, (left_rows, right_rows)) in groups {
        match (left_rows.is_empty(), right_rows.is_empty()) {
            (false, false) => {
                for &l in &left_rows {
                    for &r in &right_rows {
                        view.rows.push(MergedRow {
                            key: key_values.clone(),
                            provenance: Provenance::Both,
                            values: value_indexes
                                .iter()
                                .map(|&c| (left.rows()[l][c].clone(), right.rows()[r][c].clone()))
                                .collect(),
                        });
                    }
                }
            }
            (false, true) => {
                for &l in &left_rows {
                    view.rows.push(one_sided(&key_values, &left.rows()[l], &value_indexes, Provenance::LeftOnly));
                }
            }
            (true, _) => {
                for &r in &right_rows {
                    view.rows.push(one_sided(&key_values, &right.rows()[r], &value_indexes, Provenance::RightOnly));
                }
            }
        }
    }

    let anomaly = if view.len() != left.len().max(right.len()) {
        log::warn!("Length of input and merged tables differs!");
        log::warn!(
            "Left = {}, right = {}, merged = {}",
            left.len(),
            right.len(),
            view.len()
        );
        Some(JoinAnomaly {
            left_rows: left.len(),
            right_rows: right.len(),
            merged_rows: view.len(),
        })
    } else {
        None
    };

    log::info!(
        "Merging datasets finished, elapsed time: {:.2}s",
        start.elapsed().as_secs_f64()
    );

    Ok(Reconciliation {
        view,
        empty: None,
        anomaly,
    })
}

fn key_of(row: &[CellValue], key_indexes: &[usize]) -> Vec<CellValue> {
    key_indexes.iter().map(|&i| row[i].clone()).collect()
}

fn one_sided(key: &[CellValue], row: &[CellValue], value_indexes: &[usize], provenance: Provenance) -> MergedRow {
    let values = value_indexes
        .iter()
        .map(|&c| match provenance {
            Provenance::RightOnly => (CellValue::Null, row[c].clone()),
            _ => (row[c].clone(), CellValue::Null),
        })
        .collect();

    MergedRow {
        key: key.to_vec(),
        provenance,
        values,
    }
}
