//! refinar - Outlier Screening and Table Prep for Casting-Plant Data
//!
//! Tooling for the tables a continuous-casting steel plant exports:
//! ladle furnace logs, per-heat product records, and long-format process
//! variables. refinar screens numeric columns against engineering
//! limits and statistical fences, nulls the cells that fail, and
//! assembles the per-heat modeling table.
//!
//! # Design Principles
//!
//! 1. **Never delete rows** - A bad reading becomes a null cell; the
//!    heat it belongs to stays in the table
//! 2. **Pure Rust** - No Python, no FFI
//! 3. **Zero-copy** - Arrow `RecordBatch` throughout
//! 4. **Ecosystem aligned** - Arrow 53, Parquet 53
//!
//! # Quick Start
//!
//! ```no_run
//! use refinar::{ArrowDataset, OutlierCleaner, OutlierDetector};
//!
//! // Load an exported ladle furnace table
//! let dataset = ArrowDataset::from_csv("lf_export.csv").unwrap();
//!
//! // Flag values outside the plant's engineering limits
//! let report = OutlierDetector::new().analyze(&dataset).unwrap();
//! for column in &report.columns {
//!     if let Some(domain) = &column.domain {
//!         println!("{}: {} out of range", column.column, domain.outlier_count);
//!     }
//! }
//!
//! // Null the flagged cells and write the cleaned table
//! let (cleaned, _report) = OutlierCleaner::new().clean_domain(&dataset).unwrap();
//! cleaned.to_parquet("lf_clean.parquet").unwrap();
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
// Allow common test patterns
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::cast_lossless,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss,
        clippy::redundant_clone,
        clippy::too_many_lines,
        clippy::float_cmp,
        clippy::similar_names,
        clippy::unreadable_literal
    )
)]
// Allow some pedantic lints for cleaner code
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::map_unwrap_or)]

pub mod cli;
pub mod dataset;
pub mod error;
pub mod outlier;
pub mod prep;
mod stats;
pub mod transform;

// Re-exports for convenience
// Re-export arrow types commonly needed
pub use arrow::{
    array::RecordBatch,
    datatypes::{Schema, SchemaRef},
};
pub use dataset::{ArrowDataset, CsvOptions, Dataset, JsonOptions};
pub use error::{Error, Result};
pub use outlier::{
    CleanReport, ColumnAnalysis, DomainThresholds, MeanShift, MethodResult, OutlierCleaner,
    OutlierDetector, OutlierMethod, TableReport, mean_shift,
};
pub use prep::{GradeFilter, Join, JoinHow, VariablePivot, YearFilter, merge_casting_tables};
pub use transform::{
    BoundsFilter, Cast, Chain, Difference, Drop, ElapsedMinutes, Filter, IqrRowFilter, Map, Rename,
    Select, Skip, Sort, SortOrder, Take, Transform,
};
