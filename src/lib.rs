//! # tabcompare
//!
//! Reconciles two tabular datasets on a reference key and reports the cells
//! that differ, honoring per-column numeric tolerances so that rounding noise
//! is not reported as a defect.

pub mod aggregate;
pub mod batch;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dataset;
pub mod differ;
pub mod engine;
pub mod error;
pub mod loader;
pub mod progress;
pub mod reconcile;
pub mod report;
pub mod schema;
pub mod tolerance;
pub mod value;

pub use aggregate::{ComparisonResult, DiffCounter, JoinStats};
pub use dataset::Dataset;
pub use engine::{compare, ComparisonJob};
pub use error::{CompareError, Result};
pub use reconcile::{Provenance, ReferenceKey};
pub use tolerance::{ToleranceMode, ToleranceSet};
pub use value::CellValue;
