//! Loading source files into datasets using DuckDB

use crate::dataset::Dataset;
use crate::error::{CompareError, Result};
use crate::value::CellValue;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use duckdb::types::{TimeUnit, ValueRef};
use duckdb::Connection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Instant;

/// How a delimited source file is read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceOptions {
    pub separator: char,
    pub header: bool,
    pub skip_rows: usize,
    /// Physical line indexes (0-based, header line included) dropped before parsing
    pub ignore_rows: Vec<usize>,
    /// Names given to the loaded columns, replacing the header or positional names
    pub header_names: Vec<String>,
    /// `(from, to)` substitution applied to every line before parsing
    pub replace: Option<(String, String)>,
    /// Characters stripped from the start of every line
    pub remove_begin: Option<String>,
    /// Characters stripped from the end of every line
    pub remove_end: Option<String>,
    /// Columns on which duplicate rows are dropped after loading
    pub drop_duplicates: Vec<String>,
}

impl SourceOptions {
    /// Whether lines must be rewritten before the file can be parsed
    pub fn needs_preprocessing(&self) -> bool {
        !self.ignore_rows.is_empty() || self.replace.is_some() || self.remove_begin.is_some() || self.remove_end.is_some()
    }
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            separator: ',',
            header: true,
            skip_rows: 0,
            ignore_rows: Vec::new(),
            header_names: Vec::new(),
            replace: None,
            remove_begin: None,
            remove_end: None,
            drop_duplicates: Vec::new(),
        }
    }
}

/// Reads CSV, TSV, Parquet and JSON files through an in-memory DuckDB
pub struct DataLoader {
    connection: Connection,
}

impl DataLoader {
    pub fn new() -> Result<Self> {
        let connection = Connection::open_in_memory()?;
        connection.execute("SET enable_progress_bar=false", [])?;
        connection.execute("SET preserve_insertion_order=true", [])?;
        Ok(Self { connection })
    }

    /// Load `path` into a [`Dataset`]
    pub fn load(&self, path: &Path, options: &SourceOptions) -> Result<Dataset> {
        if !path.is_file() {
            return Err(CompareError::invalid_input(format!("File not found: {}", path.display())));
        }
        if !Self::is_supported_format(path) {
            return Err(CompareError::invalid_input(format!(
                "Unsupported file format: {}",
                path.display()
            )));
        }

        let start = Instant::now();
        let mut dataset = if options.needs_preprocessing() {
            if !is_delimited(path) {
                return Err(CompareError::invalid_input(format!(
                    "Line preprocessing only applies to delimited text files: {}",
                    path.display()
                )));
            }
            read_preprocessed(path, options)?
        } else {
            self.read_with_duckdb(path, options)?
        };

        if !options.header_names.is_empty() {
            dataset = dataset.with_column_names(&options.header_names)?;
        } else if !options.header {
            dataset = dataset.with_positional_columns();
        }
        if !options.drop_duplicates.is_empty() {
            dataset.drop_duplicates(&options.drop_duplicates)?;
        }

        log::info!(
            "Loaded {} rows and {} columns from {}, elapsed time: {:.2}s",
            dataset.len(),
            dataset.columns().len(),
            path.display(),
            start.elapsed().as_secs_f64()
        );
        Ok(dataset)
    }

    fn read_with_duckdb(&self, path: &Path, options: &SourceOptions) -> Result<Dataset> {
        self.connection
            .execute(&self.view_sql(path, options), [])
            .map_err(|e| convert_duckdb_error(e, path))?;

        let columns = self.column_names()?;
        let mut dataset = Dataset::new(columns.iter().cloned());

        let mut stmt = self.connection.prepare("SELECT * FROM data_view")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                cells.push(cell_from_ref(row.get_ref(i)?));
            }
            dataset.push_row(cells)?;
        }
        Ok(dataset)
    }

    /// Check if file format is supported
    pub fn is_supported_format(path: &Path) -> bool {
        matches!(extension(path).as_deref(), Some("csv" | "tsv" | "txt" | "parquet" | "json" | "jsonl"))
    }

    fn view_sql(&self, path: &Path, options: &SourceOptions) -> String {
        let path_str = quote(&path.to_string_lossy());
        let source = match extension(path).as_deref() {
            // delimited text is read as text so every cell is classified the same way
            Some("csv" | "tsv" | "txt") => format!(
                "read_csv({}, delim={}, header={}, skip={}, all_varchar=true)",
                path_str,
                quote(&options.separator.to_string()),
                options.header,
                options.skip_rows
            ),
            _ => path_str,
        };
        format!("CREATE OR REPLACE VIEW data_view AS SELECT * FROM {}", source)
    }

    fn column_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.connection.prepare("DESCRIBE data_view")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

fn is_delimited(path: &Path) -> bool {
    matches!(extension(path).as_deref(), Some("csv" | "tsv" | "txt"))
}

/// Rewrite the raw lines of `path`, then parse them as delimited records.
/// Every cell is classified the same way as on the DuckDB path.
fn read_preprocessed(path: &Path, options: &SourceOptions) -> Result<Dataset> {
    let content = fs::read_to_string(path)?;
    let text = preprocess_lines(&content, options);

    let delimiter = u8::try_from(options.separator)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| CompareError::invalid_input(format!("Separator '{}' is not an ASCII character", options.separator)))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            CompareError::invalid_input(format!("Malformed CSV file '{}' at record {}: {}", path.display(), i + 1, e))
        })?;
        records.push(record);
    }

    let (columns, body): (Vec<String>, &[csv::StringRecord]) = match records.split_first() {
        Some((header, body)) if options.header => (header.iter().map(str::to_string).collect(), body),
        Some((first, _)) => ((0..first.len()).map(|i| i.to_string()).collect(), &records[..]),
        None => {
            return Err(CompareError::invalid_input(format!(
                "No lines left in '{}' after preprocessing",
                path.display()
            )))
        }
    };

    let mut dataset = Dataset::new(columns);
    for record in body {
        dataset.push_row(record.iter().map(CellValue::infer).collect())?;
    }
    Ok(dataset)
}

fn preprocess_lines(content: &str, options: &SourceOptions) -> String {
    let mut text = String::with_capacity(content.len());
    for (i, line) in content.lines().enumerate() {
        if i < options.skip_rows || options.ignore_rows.contains(&i) {
            continue;
        }

        let mut line = match &options.replace {
            Some((from, to)) if !from.is_empty() => line.replace(from.as_str(), to),
            _ => line.to_string(),
        };
        if let Some(chars) = &options.remove_begin {
            line = line.trim_start_matches(|c: char| chars.contains(c)).to_string();
        }
        if let Some(chars) = &options.remove_end {
            line = line.trim_end_matches(|c: char| chars.contains(c)).to_string();
        }

        text.push_str(&line);
        text.push('\n');
    }
    text
}

fn extension(path: &Path) -> Option<String> {
    path.extension().and_then(|s| s.to_str()).map(|s| s.to_lowercase())
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Map a DuckDB value to a cell, keeping the column's native type where it
/// has a numeric counterpart
fn cell_from_ref(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Boolean(b) => CellValue::Text(b.to_string()),
        ValueRef::TinyInt(i) => CellValue::Integer(i.into()),
        ValueRef::SmallInt(i) => CellValue::Integer(i.into()),
        ValueRef::Int(i) => CellValue::Integer(i.into()),
        ValueRef::BigInt(i) => CellValue::Integer(i),
        ValueRef::HugeInt(i) => i64::try_from(i).map_or(CellValue::Float(i as f64), CellValue::Integer),
        ValueRef::UTinyInt(i) => CellValue::Integer(i.into()),
        ValueRef::USmallInt(i) => CellValue::Integer(i.into()),
        ValueRef::UInt(i) => CellValue::Integer(i.into()),
        ValueRef::UBigInt(i) => i64::try_from(i).map_or(CellValue::Float(i as f64), CellValue::Integer),
        ValueRef::Float(f) => CellValue::Float(f.into()),
        ValueRef::Double(f) => CellValue::Float(f),
        ValueRef::Decimal(d) => CellValue::infer(&d.to_string()),
        ValueRef::Text(s) => CellValue::infer(&String::from_utf8_lossy(s)),
        ValueRef::Blob(b) => CellValue::Text(format!("<blob:{} bytes>", b.len())),
        ValueRef::Date32(days) => temporal(
            NaiveDate::from_num_days_from_ce_opt(days.saturating_add(UNIX_EPOCH_DAYS_FROM_CE)),
            days,
        ),
        ValueRef::Time64(unit, t) => {
            let micros = to_micros(unit, t);
            let time = u32::try_from(micros.div_euclid(1_000_000)).ok().and_then(|secs| {
                NaiveTime::from_num_seconds_from_midnight_opt(secs, (micros.rem_euclid(1_000_000) * 1_000) as u32)
            });
            temporal(time, t)
        }
        ValueRef::Timestamp(unit, ts) => temporal(
            DateTime::<Utc>::from_timestamp_micros(to_micros(unit, ts)).map(|dt| dt.naive_utc()),
            ts,
        ),
        _ => CellValue::Text("<unknown>".to_string()),
    }
}

/// Days from 0001-01-01 to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

/// ISO text for dates and times; out-of-range values keep their raw number
fn temporal<T: std::fmt::Display>(value: Option<T>, raw: impl std::fmt::Display) -> CellValue {
    CellValue::Text(value.map_or_else(|| raw.to_string(), |v| v.to_string()))
}

fn convert_duckdb_error(error: duckdb::Error, path: &Path) -> CompareError {
    let message = error.to_string();

    if message.contains("CSV Error") || message.contains("Could not convert") || message.contains("Invalid CSV") {
        CompareError::invalid_input(format!("Malformed CSV file '{}': {}", path.display(), message))
    } else if message.contains("JSON") {
        CompareError::invalid_input(format!("Malformed JSON file '{}': {}", path.display(), message))
    } else if message.contains("No files found") || message.contains("does not exist") {
        CompareError::invalid_input(format!("File not found: {}", path.display()))
    } else {
        CompareError::DuckDb(error)
    }
}
