//! Row filters for grade and time-window selection.

use arrow::array::{Array, AsArray, BooleanArray, StringArray};
use arrow::compute::kernels::temporal::{date_part, DatePart};
use arrow::compute::{cast_with_options, filter_record_batch};
use arrow::datatypes::{DataType, Int32Type, TimeUnit};
use arrow::record_batch::RecordBatch;

use crate::error::{Error, Result};
use crate::stats;
use crate::transform::Transform;

/// Keeps rows whose grade column contains a pattern, ignoring case.
///
/// Null grades drop: a heat without a recorded grade cannot be claimed
/// for the target alloy family.
///
/// # Example
///
/// ```ignore
/// use refinar::{ArrowDataset, GradeFilter};
///
/// let products = ArrowDataset::from_csv("products.csv")?;
/// let low_carbon = products.with_transform(GradeFilter::contains("SAE1006AL"))?;
/// ```
#[derive(Debug, Clone)]
pub struct GradeFilter {
    column: String,
    pattern: String,
}

impl GradeFilter {
    /// Grade column of the product table.
    pub const DEFAULT_COLUMN: &'static str = "STEEL_GRADE_NAME";

    /// Filter on an explicit column.
    pub fn new(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            pattern: pattern.into(),
        }
    }

    /// Filter on the standard grade column.
    pub fn contains(pattern: impl Into<String>) -> Self {
        Self::new(Self::DEFAULT_COLUMN, pattern)
    }
}

impl Transform for GradeFilter {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let schema = batch.schema();
        let (idx, field) = schema
            .column_with_name(&self.column)
            .ok_or_else(|| Error::column_not_found(&self.column))?;
        let grades = batch
            .column(idx)
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| {
                Error::data(format!(
                    "Grade column '{}' is {:?}, expected a string column",
                    self.column,
                    field.data_type()
                ))
            })?;

        let needle = self.pattern.to_lowercase();
        let mask: Vec<bool> = (0..grades.len())
            .map(|row| !grades.is_null(row) && grades.value(row).to_lowercase().contains(&needle))
            .collect();
        Ok(filter_record_batch(&batch, &BooleanArray::from(mask))?)
    }
}

/// Keeps rows whose date column falls in one calendar year.
///
/// Accepts native date and timestamp columns as well as string columns
/// parseable as dates. Rows with null or unparseable dates drop.
#[derive(Debug, Clone)]
pub struct YearFilter {
    column: String,
    year: i32,
}

impl YearFilter {
    /// Filter `column` to rows within `year`.
    pub fn new(column: impl Into<String>, year: i32) -> Self {
        Self {
            column: column.into(),
            year,
        }
    }

    /// The year rows must fall in.
    pub fn year(&self) -> i32 {
        self.year
    }
}

impl Transform for YearFilter {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let schema = batch.schema();
        let (idx, field) = schema
            .column_with_name(&self.column)
            .ok_or_else(|| Error::column_not_found(&self.column))?;
        let column = batch.column(idx);

        let dated = match field.data_type() {
            DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => column.clone(),
            DataType::Utf8 | DataType::LargeUtf8 => cast_with_options(
                column.as_ref(),
                &DataType::Timestamp(TimeUnit::Millisecond, None),
                &stats::coercing_options(),
            )
            .map_err(|e| {
                Error::data(format!(
                    "Cannot read column '{}' as dates: {}",
                    self.column, e
                ))
            })?,
            other => {
                return Err(Error::data(format!(
                    "Date column '{}' is {:?}, expected date, timestamp, or string",
                    self.column, other
                )));
            }
        };

        let years = date_part(dated.as_ref(), DatePart::Year)?;
        let mask: Vec<bool> = years
            .as_primitive::<Int32Type>()
            .iter()
            .map(|y| y == Some(self.year))
            .collect();
        Ok(filter_record_batch(&batch, &BooleanArray::from(mask))?)
    }
}
