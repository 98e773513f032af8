//! JSON batch configuration

use crate::engine::ComparisonJob;
use crate::error::{CompareError, Result};
use crate::loader::SourceOptions;
use crate::reconcile::ReferenceKey;
use crate::tolerance::{default_mode, ColumnTolerance, DefaultTolerance};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// A batch of comparisons sharing one output folder and one set of defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default)]
    pub defaults: Defaults,
    pub comparisons: Vec<JobConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Defaults {
    /// Evaluated top to bottom, first full match wins
    #[serde(default)]
    pub tolerances: Vec<DefaultTolerance>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub left: PathBuf,
    pub right: PathBuf,
    #[serde(default = "default_separator")]
    pub separator: char,
    #[serde(default = "default_true")]
    pub header: bool,
    #[serde(default)]
    pub skip_rows: usize,
    /// Line indexes dropped before parsing, header line included
    #[serde(default)]
    pub ignore_rows: Vec<usize>,
    #[serde(default)]
    pub header_names: Vec<String>,
    /// `["from", "to"]` substitution applied to every line
    #[serde(default)]
    pub replace: Option<(String, String)>,
    #[serde(default)]
    pub remove_begin: Option<String>,
    #[serde(default)]
    pub remove_end: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
}

/// Per-column attributes. Columns not listed are compared without tolerance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(default)]
    pub reference: bool,
    #[serde(default)]
    pub ignore: bool,
    #[serde(default)]
    pub tolerance: Option<f64>,
    #[serde(default)]
    pub tolerance_mode: Option<String>,
    #[serde(default)]
    pub drop_duplicates: bool,
    #[serde(default)]
    pub count_difference: bool,
}

fn default_output() -> PathBuf {
    PathBuf::from("output")
}

fn default_true() -> bool {
    true
}

fn default_separator() -> char {
    ','
}

impl BatchConfig {
    /// Read and validate a configuration file. Relative source and output
    /// paths are resolved against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            log::error!("Cannot read configuration {}: {}", path.display(), e);
            e
        })?;
        let mut config: Self = serde_json::from_str(&content)?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config.validate()?;

        log::info!(
            "Loaded configuration {} with {} comparisons",
            path.display(),
            config.comparisons.len()
        );
        Ok(config)
    }

    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.output);
        for job in &mut self.comparisons {
            resolve(&mut job.left);
            resolve(&mut job.right);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for job in &self.comparisons {
            if !names.insert(job.name.as_str()) {
                return Err(CompareError::config(format!("Duplicate comparison name '{}'", job.name)));
            }
            if job.enabled {
                job.validate()?;
            }
        }
        Ok(())
    }
}

impl JobConfig {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CompareError::config("Comparison name must not be empty"));
        }
        if !self.columns.iter().any(|c| c.reference) {
            return Err(CompareError::config(format!(
                "Comparison '{}' has no reference column",
                self.name
            )));
        }

        if matches!(&self.replace, Some((from, _)) if from.is_empty()) {
            return Err(CompareError::config(format!(
                "Comparison '{}' has an empty replace pattern",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(CompareError::config(format!(
                    "Column '{}' is configured twice in comparison '{}'",
                    column.name, self.name
                )));
            }
            if column.tolerance.is_none() && column.tolerance_mode.is_some() {
                return Err(CompareError::config(format!(
                    "Column '{}' has a tolerance mode but no tolerance",
                    column.name
                )));
            }
            if column.reference && column.ignore {
                return Err(CompareError::config(format!(
                    "Reference column '{}' cannot be ignored",
                    column.name
                )));
            }
        }
        Ok(())
    }

    pub fn source_options(&self) -> SourceOptions {
        SourceOptions {
            separator: self.separator,
            header: self.header,
            skip_rows: self.skip_rows,
            ignore_rows: self.ignore_rows.clone(),
            header_names: self.header_names.clone(),
            replace: self.replace.clone(),
            remove_begin: self.remove_begin.clone(),
            remove_end: self.remove_end.clone(),
            drop_duplicates: self
                .columns
                .iter()
                .filter(|c| c.drop_duplicates)
                .map(|c| c.name.clone())
                .collect(),
        }
    }

    /// Build the engine job. `defaults` are the batch-wide default tolerances.
    pub fn to_job(&self, defaults: &[DefaultTolerance]) -> Result<ComparisonJob> {
        let key = ReferenceKey::new(self.columns.iter().filter(|c| c.reference).map(|c| c.name.clone()))?;
        let names = |pred: fn(&ColumnConfig) -> bool| -> Vec<String> {
            self.columns.iter().filter(|c| pred(c)).map(|c| c.name.clone()).collect()
        };

        Ok(ComparisonJob {
            name: self.name.clone(),
            key,
            tolerances: self
                .columns
                .iter()
                .filter_map(|c| {
                    c.tolerance.map(|t| {
                        ColumnTolerance::new(&c.name, t, c.tolerance_mode.clone().unwrap_or_else(default_mode))
                    })
                })
                .collect(),
            defaults: defaults.to_vec(),
            ignore: names(|c| c.ignore),
            count_difference: names(|c| c.count_difference),
        })
    }
}
