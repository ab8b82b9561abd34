//! Shared numeric helpers for column statistics.
//!
//! The outlier engine and the row-level filters must agree exactly on how
//! quantiles and spreads are computed; this module is the single home for
//! that arithmetic. Missing means null or NaN throughout: both are skipped
//! by every statistic here.

use arrow::{
    array::{Array, Float64Array, RecordBatch},
    compute::{cast_with_options, CastOptions},
    datatypes::DataType,
};

use crate::error::{Error, Result};

/// Cast options that coerce unconvertible values to null instead of
/// failing the whole column.
pub(crate) fn coercing_options() -> CastOptions<'static> {
    CastOptions {
        safe: true,
        ..CastOptions::default()
    }
}

/// Returns true for Arrow types the engine treats as numeric observations.
pub(crate) fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
    )
}

/// Extracts a column as Float64, coercing unconvertible values to null.
pub(crate) fn column_as_f64(batch: &RecordBatch, name: &str) -> Result<Float64Array> {
    let schema = batch.schema();
    let (idx, _) = schema
        .column_with_name(name)
        .ok_or_else(|| Error::column_not_found(name))?;

    let float_array = cast_with_options(
        batch.column(idx).as_ref(),
        &DataType::Float64,
        &coercing_options(),
    )
    .map_err(|e| Error::data(format!("Column '{}' is not numeric: {}", name, e)))?;

    float_array
        .as_any()
        .downcast_ref::<Float64Array>()
        .cloned()
        .ok_or_else(|| Error::data("Expected Float64Array after cast"))
}

/// Collects the non-missing values of a Float64 column.
pub(crate) fn non_missing(array: &Float64Array) -> Vec<f64> {
    array.iter().flatten().filter(|v| !v.is_nan()).collect()
}

/// Linear-interpolation quantile of an ascending-sorted slice.
///
/// The quantile position is `(n - 1) * q`; fractional positions
/// interpolate between the neighboring values.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub(crate) fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let pos = (sorted.len() - 1) as f64 * q;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }

    let weight = pos - lower as f64;
    Some(sorted[lower] * (1.0 - weight) + sorted[upper] * weight)
}

/// IQR fences `(Q1 - factor*IQR, Q3 + factor*IQR)` of an ascending-sorted
/// slice. Fewer than four values establish no bounds.
pub(crate) fn iqr_bounds(sorted: &[f64], factor: f64) -> Option<(f64, f64)> {
    if sorted.len() < 4 {
        return None;
    }

    let q1 = quantile_sorted(sorted, 0.25)?;
    let q3 = quantile_sorted(sorted, 0.75)?;
    let iqr = q3 - q1;
    Some((q1 - factor * iqr, q3 + factor * iqr))
}

/// Arithmetic mean; None for an empty slice.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator); needs at least two
/// values.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn sample_std(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Population standard deviation (n denominator); None for an empty slice.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn population_std(values: &[f64], mean: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    Some((sum_sq / values.len() as f64).sqrt())
}
