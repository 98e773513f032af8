//! Typed cell values
//!
//! A cell's type is fixed when the dataset is built, either from the column
//! types reported by the loader or by [`CellValue::infer`] for raw text.
//! Comparison never re-parses a value.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A single scalar cell
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Null,
}

/// Comparison class of a cell, used to pick the comparison semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Numeric,
    String,
}

impl CellValue {
    /// Classify raw text. Empty text is null, anything that reads as an
    /// integer or a finite float is numeric, everything else is text.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Null;
        }

        if let Ok(i) = trimmed.parse::<i64>() {
            return Self::Integer(i);
        }

        if looks_like_float(trimmed) {
            if let Ok(f) = trimmed.parse::<f64>() {
                if f.is_finite() {
                    return Self::Float(f);
                }
            }
        }

        Self::Text(raw.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Null and text both compare as strings
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Integer(_) | Self::Float(_) => ValueKind::Numeric,
            Self::Text(_) | Self::Null => ValueKind::String,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Integer(_) | Self::Float(_) => 1,
            Self::Text(_) => 2,
        }
    }
}

/// Numeric difference `left - right`, exact for integer pairs
pub fn numeric_delta(left: &CellValue, right: &CellValue) -> Option<f64> {
    match (left, right) {
        (CellValue::Integer(l), CellValue::Integer(r)) => Some((*l as i128 - *r as i128) as f64),
        _ => Some(left.as_f64()? - right.as_f64()?),
    }
}

// Rust's float parser accepts "inf", "NaN" and friends; those stay text.
fn looks_like_float(s: &str) -> bool {
    let digits = s.trim_start_matches(['+', '-']);
    digits.chars().next().map_or(false, |c| c.is_ascii_digit() || c == '.')
        && digits
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => {
                if a == b {
                    Ordering::Equal
                } else {
                    a.total_cmp(b)
                }
            }
            (Self::Integer(a), Self::Float(b)) => cmp_integer_float(*a, *b),
            (Self::Float(a), Self::Integer(b)) => cmp_integer_float(*b, *a).reverse(),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Null, Self::Null) => Ordering::Equal,
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

/// Exact comparison of an integer against a float, without rounding the
/// integer onto the float line
fn cmp_integer_float(int: i64, float: f64) -> Ordering {
    // 2^63, the first float above every i64
    const UPPER: f64 = 9_223_372_036_854_775_808.0;

    if float.is_nan() {
        // same placement as f64::total_cmp
        return if float.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if float >= UPPER {
        return Ordering::Less;
    }
    if float < -UPPER {
        return Ordering::Greater;
    }

    let whole = float.trunc();
    match int.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(float - whole)).unwrap_or(Ordering::Equal),
        unequal => unequal,
    }
}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellValue {}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => write!(f, "{}", s),
            Self::Null => Ok(()),
        }
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
