//! Outlier screening for continuous-casting plant exports.
//!
//! Sensor glitches and manual entry leave physically impossible values
//! in plant tables: a 50 degree steel temperature, a five-hour negative
//! wait. This module flags such values with interchangeable range
//! methods and neutralizes them by nulling the cell, never by deleting
//! the row, so heats stay joinable across tables.
//!
//! Three methods, one result shape:
//! - **Domain**: fixed engineering limits from a [`DomainThresholds`] table.
//! - **IQR**: Tukey fences derived from the column itself.
//! - **Z-score**: bounds at k standard deviations from the mean.
//!
//! # Example
//!
//! ```ignore
//! use refinar::{ArrowDataset, OutlierCleaner, OutlierDetector};
//!
//! let dataset = ArrowDataset::from_csv("lf_export.csv")?;
//!
//! let report = OutlierDetector::new().analyze(&dataset)?;
//! for column in &report.columns {
//!     if let Some(domain) = &column.domain {
//!         println!("{}: {} out of range", column.column, domain.outlier_count);
//!     }
//! }
//!
//! let (cleaned, changes) = OutlierCleaner::new().clean_domain(&dataset)?;
//! println!("nulled {} cells", changes.total_replaced);
//! ```

// Count columns in summary tables are u64
#![allow(clippy::cast_possible_truncation)]

mod clean;
mod detect;
mod thresholds;


// Re-export detection types
pub use detect::{ColumnAnalysis, MethodResult, OutlierDetector, OutlierMethod, TableReport};

// Re-export cleaning types
pub use clean::{CleanReport, MeanShift, OutlierCleaner, mean_shift};

// Re-export the threshold table
pub use thresholds::DomainThresholds;
