//! Tolerance rules and their resolution into one effective rule set
//!
//! Explicit rules come from the comparison job, default rules from an ordered
//! list of column-name patterns. A column's explicit rule always wins; among
//! default rules the first pattern that matches the *whole* column name wins.

use crate::error::{CompareError, Result};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

/// How a tolerance bound is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToleranceMode {
    /// `|left - right| <= tolerance`
    #[serde(rename = "abs")]
    Absolute,
    /// `|left - right| / |right| <= tolerance`
    #[serde(rename = "rel")]
    Relative,
}

impl FromStr for ToleranceMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abs" => Ok(Self::Absolute),
            "rel" => Ok(Self::Relative),
            _ => Err(format!("Invalid tolerance mode: {}. Use 'abs' or 'rel'", s)),
        }
    }
}

impl fmt::Display for ToleranceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute => write!(f, "abs"),
            Self::Relative => write!(f, "rel"),
        }
    }
}

/// Where an effective rule came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "pattern")]
pub enum RuleSource {
    Explicit,
    Default(String),
}

/// A validated, column-scoped tolerance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToleranceRule {
    pub tolerance: f64,
    pub mode: ToleranceMode,
    pub source: RuleSource,
}

impl ToleranceRule {
    pub fn new(tolerance: f64, mode: ToleranceMode) -> Self {
        Self {
            tolerance,
            mode,
            source: RuleSource::Explicit,
        }
    }

    /// Whether two numbers are equal within this rule.
    /// In relative mode a zero right-hand value never matches.
    ///
    /// The deviation may exceed the bound by at most the rounding error the
    /// two operands picked up when parsed from decimal text, half an ULP each.
    pub fn accepts(&self, left: f64, right: f64) -> bool {
        let deviation = (left - right).abs();
        let slack = 0.5 * (ulp(left) + ulp(right));

        match self.mode {
            ToleranceMode::Absolute => deviation - slack <= self.tolerance,
            ToleranceMode::Relative => {
                if right == 0.0 {
                    return false;
                }
                (deviation - slack) / right.abs() <= self.tolerance
            }
        }
    }

    /// Exact check for integer pairs; no rounding slack applies.
    pub fn accepts_integers(&self, left: i64, right: i64) -> bool {
        let deviation = (i128::from(left) - i128::from(right)).unsigned_abs();

        match self.mode {
            // saturating cast, the bound is finite and non-negative
            ToleranceMode::Absolute => deviation <= self.tolerance.floor() as u128,
            ToleranceMode::Relative => {
                if right == 0 {
                    return false;
                }
                deviation as f64 / (right as f64).abs() <= self.tolerance
            }
        }
    }
}

/// Distance from `x` to the next representable float away from zero
fn ulp(x: f64) -> f64 {
    let x = x.abs();
    if !x.is_finite() {
        return 0.0;
    }
    f64::from_bits(x.to_bits() + 1) - x
}

/// A tolerance rule as supplied by configuration, mode not yet validated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTolerance {
    pub column: String,
    pub tolerance: f64,
    pub mode: String,
}

impl ColumnTolerance {
    pub fn new(column: impl Into<String>, tolerance: f64, mode: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            tolerance,
            mode: mode.into(),
        }
    }
}

/// A pattern-based default rule: applies to every column whose full name
/// matches `name`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultTolerance {
    pub name: String,
    pub tolerance: f64,
    #[serde(default = "default_mode")]
    pub tolerance_mode: String,
}

pub(crate) fn default_mode() -> String {
    ToleranceMode::Absolute.to_string()
}

impl DefaultTolerance {
    pub fn new(name: impl Into<String>, tolerance: f64, tolerance_mode: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tolerance,
            tolerance_mode: tolerance_mode.into(),
        }
    }
}

/// The effective, immutable rule set of one comparison
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToleranceSet {
    rules: IndexMap<String, ToleranceRule>,
}

impl ToleranceSet {
    pub fn get(&self, column: &str) -> Option<&ToleranceRule> {
        self.rules.get(column)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ToleranceRule)> {
        self.rules.iter()
    }
}

/// Merge explicit and default rules for `columns`, skipping `key_columns`.
///
/// Pure: the inputs are left untouched and a new set is returned. Explicit
/// rules keep their configured order; default-installed rules follow in
/// schema order.
pub fn resolve_tolerances(
    explicit: &[ColumnTolerance],
    defaults: &[DefaultTolerance],
    columns: &[String],
    key_columns: &[String],
) -> Result<ToleranceSet> {
    let start = Instant::now();
    let mut rules = IndexMap::new();

    for rule in explicit {
        let mode = parse_mode(&rule.column, &rule.mode)?;
        check_bound(&rule.column, rule.tolerance)?;
        rules.insert(rule.column.clone(), ToleranceRule::new(rule.tolerance, mode));
    }

    let patterns = compile_defaults(defaults)?;

    for column in columns {
        if key_columns.contains(column) || rules.contains_key(column) {
            continue;
        }

        let Some((default, _)) = patterns.iter().find(|(_, regex)| full_match(regex, column)) else {
            continue;
        };

        let mode = parse_mode(column, &default.tolerance_mode)?;
        check_bound(column, default.tolerance)?;
        log::info!(
            "\tTolerance for column updated: {:<10}\t\t\"tolerance\": {},\t\"tolerance_mode\": {}",
            column,
            default.tolerance,
            mode
        );
        rules.insert(
            column.clone(),
            ToleranceRule {
                tolerance: default.tolerance,
                mode,
                source: RuleSource::Default(default.name.clone()),
            },
        );
    }

    log::info!(
        "Applying the defaults to configuration finished, elapsed time: {:.2}s",
        start.elapsed().as_secs_f64()
    );

    Ok(ToleranceSet { rules })
}

fn compile_defaults(defaults: &[DefaultTolerance]) -> Result<Vec<(&DefaultTolerance, Regex)>> {
    defaults
        .iter()
        .map(|default| {
            Regex::new(&default.name).map(|regex| (default, regex)).map_err(|e| {
                log::error!("Default tolerance pattern '{}' does not compile: {}", default.name, e);
                CompareError::InvalidPattern {
                    pattern: default.name.clone(),
                    message: e.to_string(),
                }
            })
        })
        .collect()
}

/// A match counts only when the leftmost match spans the whole name
fn full_match(regex: &Regex, name: &str) -> bool {
    regex
        .find(name)
        .map_or(false, |m| m.start() == 0 && m.end() == name.len())
}

fn parse_mode(column: &str, mode: &str) -> Result<ToleranceMode> {
    mode.parse().map_err(|_| {
        log::error!("Unknown tolerance mode '{}' for column '{}'", mode, column);
        CompareError::invalid_tolerance_mode(column, mode)
    })
}

fn check_bound(column: &str, tolerance: f64) -> Result<()> {
    if tolerance.is_finite() && tolerance >= 0.0 {
        Ok(())
    } else {
        log::error!("Tolerance {} for column '{}' must be a non-negative number", tolerance, column);
        Err(CompareError::InvalidTolerance {
            column: column.to_string(),
            tolerance,
        })
    }
}
