//! In-memory tabular datasets

use crate::error::{CompareError, Result};
use crate::value::CellValue;
use std::collections::BTreeSet;

/// An ordered set of rows sharing one ordered schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    /// Create an empty dataset with the given schema
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a dataset from raw text rows, classifying every cell once
    pub fn from_text_rows<S: AsRef<str>>(columns: &[&str], rows: &[Vec<S>]) -> Result<Self> {
        let mut dataset = Self::new(columns.iter().copied());
        for row in rows {
            dataset.push_row(row.iter().map(|cell| CellValue::infer(cell.as_ref())).collect())?;
        }
        Ok(dataset)
    }

    /// Append a row; its width must match the schema
    pub fn push_row(&mut self, row: Vec<CellValue>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(CompareError::invalid_input(format!(
                "Row {} has {} values but the schema has {} columns",
                self.rows.len(),
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn value(&self, row: usize, column: usize) -> Option<&CellValue> {
        self.rows.get(row)?.get(column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rename every column to its position ("0", "1", ...) for header-less sources
    pub fn with_positional_columns(mut self) -> Self {
        self.columns = (0..self.columns.len()).map(|i| i.to_string()).collect();
        self
    }

    /// Replace the column names; `names` must cover every column
    pub fn with_column_names(mut self, names: &[String]) -> Result<Self> {
        if names.len() != self.columns.len() {
            return Err(CompareError::invalid_input(format!(
                "{} header names given for {} columns",
                names.len(),
                self.columns.len()
            )));
        }
        self.columns = names.to_vec();
        Ok(self)
    }

    /// Drop rows repeating an earlier row's values on `subset`, keeping the first.
    /// Returns the number of rows removed.
    pub fn drop_duplicates(&mut self, subset: &[String]) -> Result<usize> {
        if subset.is_empty() {
            return Ok(0);
        }

        let indexes = subset
            .iter()
            .map(|name| {
                self.column_index(name).ok_or_else(|| {
                    CompareError::config(format!("Duplicate-check column '{}' not found", name))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let before = self.rows.len();
        let mut seen = BTreeSet::new();
        self.rows.retain(|row| {
            let key: Vec<CellValue> = indexes.iter().map(|&i| row[i].clone()).collect();
            seen.insert(key)
        });

        let removed = before - self.rows.len();
        if removed > 0 {
            log::info!("Dropped {} duplicate rows on columns [{}]", removed, subset.join(", "));
        }
        Ok(removed)
    }
}
