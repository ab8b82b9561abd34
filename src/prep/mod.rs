//! Preparation pipeline for the casting-machine exports.
//!
//! The machine historian dumps three related tables: a long-format
//! variable table keyed by `(report, product, variable)`, a product
//! table, and a heat table keyed by report. This module reshapes and
//! links them into the wide modeling table: pivot the variables to
//! columns, join products with the pivoted variables, join heats, sort.
//!
//! # Example
//!
//! ```ignore
//! use refinar::{prep, ArrowDataset, VariablePivot};
//!
//! let vars = ArrowDataset::from_csv("maschinendaten.csv")?;
//! let products = ArrowDataset::from_csv("products.csv")?;
//! let heats = ArrowDataset::from_csv("heats.csv")?;
//!
//! let merged = prep::merge_casting_tables(
//!     &vars, &products, &heats,
//!     &VariablePivot::casting_defaults(),
//! )?;
//! merged.to_parquet("modeling_table.parquet")?;
//! ```

use crate::dataset::ArrowDataset;
use crate::error::Result;
use crate::transform::{Sort, SortOrder, Transform};

mod filter;
mod join;
mod pivot;


// Re-export join types
pub use join::{Join, JoinHow};

// Re-export pivot types
pub use pivot::VariablePivot;

// Re-export row filters
pub use filter::{GradeFilter, YearFilter};

/// The canonical merge of the three casting-machine tables.
///
/// Pivots the variable table, left-joins the product table with the
/// pivoted variables on `(report, product)`, left-joins the heat table
/// on the report counter, and sorts by `(report, product)`.
pub fn merge_casting_tables(
    variables: &ArrowDataset,
    products: &ArrowDataset,
    heats: &ArrowDataset,
    pivot: &VariablePivot,
) -> Result<ArrowDataset> {
    let wide = pivot.apply(variables)?;
    let with_vars =
        Join::left([VariablePivot::REPORT_KEY, VariablePivot::PRODUCT_KEY]).apply(products, &wide)?;
    let with_heats = Join::left([VariablePivot::REPORT_KEY]).apply(&with_vars, heats)?;

    let sorted = Sort::by_columns([
        (VariablePivot::REPORT_KEY, SortOrder::Ascending),
        (VariablePivot::PRODUCT_KEY, SortOrder::Ascending),
    ])
    .apply(with_heats.to_single_batch()?)?;
    ArrowDataset::from_batch(sorted)
}
