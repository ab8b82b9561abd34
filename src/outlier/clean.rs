//! Neutralizes out-of-range cells by replacing them with nulls.
//!
//! Cleaning never deletes rows. A flagged cell becomes a null in its
//! original column type, so downstream imputation sees it the same way
//! as a value that was never recorded.

use std::collections::BTreeMap;
use std::sync::Arc;

use arrow::array::{BooleanArray, Float64Array};
use arrow::compute::nullif;
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use serde::Serialize;

use super::DomainThresholds;
use crate::dataset::ArrowDataset;
use crate::error::Result;
use crate::stats;
use crate::transform::{Difference, Transform};

/// What a cleaning pass changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanReport {
    /// Cells nulled per column; only columns with at least one
    /// replacement appear.
    pub replaced: BTreeMap<String, usize>,
    /// Cells nulled across all columns.
    pub total_replaced: usize,
}

impl CleanReport {
    /// Number of columns that had at least one cell replaced.
    pub fn columns_affected(&self) -> usize {
        self.replaced.len()
    }
}

/// Change in a column's mean across a cleaning pass.
#[derive(Debug, Clone, Serialize)]
pub struct MeanShift {
    /// Column name.
    pub column: String,
    /// Mean before cleaning, when the column had non-missing values.
    pub before: Option<f64>,
    /// Mean after cleaning.
    pub after: Option<f64>,
}

impl MeanShift {
    /// `after - before`, when both sides have a mean.
    pub fn change(&self) -> Option<f64> {
        match (self.before, self.after) {
            (Some(before), Some(after)) => Some(after - before),
            _ => None,
        }
    }
}

/// Per-column mean comparison between two versions of the same table,
/// typically the input and output of a cleaning pass.
pub fn mean_shift(
    before: &ArrowDataset,
    after: &ArrowDataset,
    columns: &[&str],
) -> Result<Vec<MeanShift>> {
    let before_batch = before.to_single_batch()?;
    let after_batch = after.to_single_batch()?;

    let mut shifts = Vec::with_capacity(columns.len());
    for column in columns {
        let b = stats::column_as_f64(&before_batch, column)?;
        let a = stats::column_as_f64(&after_batch, column)?;
        shifts.push(MeanShift {
            column: (*column).to_string(),
            before: stats::mean(&stats::non_missing(&b)),
            after: stats::mean(&stats::non_missing(&a)),
        });
    }
    Ok(shifts)
}

/// Replaces out-of-range cells with nulls, column by column.
///
/// Domain cleaning also recomputes the temperature-loss column once the
/// inlet and outlet temperatures have been cleaned, so a loss derived
/// from a bogus reading does not survive the pass.
///
/// # Example
///
/// ```ignore
/// use refinar::{ArrowDataset, OutlierCleaner};
///
/// let dataset = ArrowDataset::from_parquet("lf.parquet")?;
/// let (cleaned, report) = OutlierCleaner::new().clean_domain(&dataset)?;
/// println!("nulled {} cells in {} columns",
///     report.total_replaced, report.columns_affected());
/// ```
#[derive(Debug, Clone)]
pub struct OutlierCleaner {
    thresholds: DomainThresholds,
    inlet: String,
    outlet: String,
    loss: String,
}

impl Default for OutlierCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl OutlierCleaner {
    /// Cleaner with the built-in threshold table and the ladle furnace
    /// temperature-loss columns.
    pub fn new() -> Self {
        Self {
            thresholds: DomainThresholds::default(),
            inlet: "nhiet_do_vao_tl".to_string(),
            outlet: "nhiet_do_ra_thep".to_string(),
            loss: "temp_loss".to_string(),
        }
    }

    /// Replaces the threshold table.
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: DomainThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Overrides the columns used for the temperature-loss recompute.
    #[must_use]
    pub fn with_temp_loss(
        mut self,
        inlet: impl Into<String>,
        outlet: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        self.inlet = inlet.into();
        self.outlet = outlet.into();
        self.loss = output.into();
        self
    }

    /// Nulls every cell outside its column's threshold range, then
    /// recomputes the temperature loss when both source columns exist.
    ///
    /// Columns without a threshold entry are untouched. Returns the
    /// cleaned dataset and a report of what changed.
    pub fn clean_domain(&self, dataset: &ArrowDataset) -> Result<(ArrowDataset, CleanReport)> {
        let batch = dataset.to_single_batch()?;
        let (batch, report) =
            self.null_outside(batch, |column, _| self.thresholds.get(column))?;

        let schema = batch.schema();
        let batch = if schema.column_with_name(&self.inlet).is_some()
            && schema.column_with_name(&self.outlet).is_some()
        {
            Difference::new(&self.inlet, &self.outlet, &self.loss).apply(batch)?
        } else {
            batch
        };

        Ok((ArrowDataset::from_batch(batch)?, report))
    }

    /// Nulls every cell outside the Tukey fences of its own column.
    ///
    /// Columns with fewer than 4 non-missing values are untouched.
    pub fn clean_iqr(
        &self,
        dataset: &ArrowDataset,
        factor: f64,
    ) -> Result<(ArrowDataset, CleanReport)> {
        let batch = dataset.to_single_batch()?;
        let (batch, report) = self.null_outside(batch, |_, values| {
            let mut sorted = stats::non_missing(values);
            sorted.sort_by(f64::total_cmp);
            stats::iqr_bounds(&sorted, factor)
        })?;
        Ok((ArrowDataset::from_batch(batch)?, report))
    }

    /// Applies `bounds_for` to every numeric column and nulls the cells
    /// strictly outside the returned range. NaN cells are left alone;
    /// they already read as missing.
    fn null_outside(
        &self,
        batch: RecordBatch,
        bounds_for: impl Fn(&str, &Float64Array) -> Option<(f64, f64)>,
    ) -> Result<(RecordBatch, CleanReport)> {
        let schema = batch.schema();
        let mut fields = Vec::with_capacity(schema.fields().len());
        let mut arrays = Vec::with_capacity(batch.num_columns());
        let mut replaced = BTreeMap::new();

        for (idx, field) in schema.fields().iter().enumerate() {
            let array = batch.column(idx);
            if !stats::is_numeric(field.data_type()) {
                fields.push(field.as_ref().clone());
                arrays.push(array.clone());
                continue;
            }

            let values = stats::column_as_f64(&batch, field.name())?;
            let (lower, upper) = match bounds_for(field.name(), &values) {
                Some(bounds) => bounds,
                None => {
                    fields.push(field.as_ref().clone());
                    arrays.push(array.clone());
                    continue;
                }
            };

            let mask: Vec<bool> = values
                .iter()
                .map(|value| matches!(value, Some(v) if !v.is_nan() && (v < lower || v > upper)))
                .collect();
            let count = mask.iter().filter(|&&hit| hit).count();
            if count == 0 {
                fields.push(field.as_ref().clone());
                arrays.push(array.clone());
                continue;
            }

            let nulled = nullif(array.as_ref(), &BooleanArray::from(mask))?;
            fields.push(Field::new(field.name(), field.data_type().clone(), true));
            arrays.push(nulled);
            replaced.insert(field.name().clone(), count);
        }

        let total_replaced = replaced.values().sum();
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;
        Ok((batch, CleanReport { replaced, total_replaced }))
    }
}
