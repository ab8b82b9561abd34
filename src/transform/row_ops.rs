//! Row-level operations: sorting, slicing, and validity filters.

use std::sync::Arc;

use arrow::{
    array::{Array, BooleanArray, RecordBatch},
    compute::filter_record_batch,
};

use super::Transform;
use crate::{
    error::{Error, Result},
    stats,
};

/// A transform that takes the first N rows from a RecordBatch.
///
/// # Example
///
/// ```ignore
/// use refinar::Take;
///
/// let take = Take::new(100); // Take first 100 heats
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Take {
    count: usize,
}

impl Take {
    /// Creates a Take transform that keeps the first `count` rows.
    pub fn new(count: usize) -> Self {
        Self { count }
    }

    /// Returns the number of rows to take.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl Transform for Take {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let num_rows = batch.num_rows();
        if self.count >= num_rows {
            return Ok(batch);
        }

        Ok(batch.slice(0, self.count))
    }
}

/// A transform that skips the first N rows from a RecordBatch.
///
/// # Example
///
/// ```ignore
/// use refinar::Skip;
///
/// let skip = Skip::new(10); // Skip first 10 rows
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Skip {
    count: usize,
}

impl Skip {
    /// Creates a Skip transform that skips the first `count` rows.
    pub fn new(count: usize) -> Self {
        Self { count }
    }

    /// Returns the number of rows to skip.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl Transform for Skip {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let num_rows = batch.num_rows();
        if self.count >= num_rows {
            // Skip all rows - return empty batch with same schema
            return Ok(batch.slice(0, 0));
        }

        let remaining = num_rows - self.count;
        Ok(batch.slice(self.count, remaining))
    }
}

/// Sort order for the Sort transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ascending order (smallest to largest)
    #[default]
    Ascending,
    /// Descending order (largest to smallest)
    Descending,
}

/// A transform that sorts rows by one or more columns.
///
/// # Example
///
/// ```ignore
/// use refinar::{Sort, SortOrder};
///
/// // Sort merged observations by report counter, then product counter
/// let sort = Sort::by_columns(vec![
///     ("REPORT_COUNTER", SortOrder::Ascending),
///     ("PROD_COUNTER", SortOrder::Ascending),
/// ]);
/// ```
#[derive(Debug, Clone)]
pub struct Sort {
    columns: Vec<(String, SortOrder)>,
    nulls_first: bool,
}

impl Sort {
    /// Creates a Sort transform for a single column (ascending by default).
    pub fn by<S: Into<String>>(column: S) -> Self {
        Self {
            columns: vec![(column.into(), SortOrder::Ascending)],
            nulls_first: false,
        }
    }

    /// Creates a Sort transform for multiple columns with specified orders.
    pub fn by_columns<S: Into<String>>(columns: impl IntoIterator<Item = (S, SortOrder)>) -> Self {
        Self {
            columns: columns
                .into_iter()
                .map(|(name, order)| (name.into(), order))
                .collect(),
            nulls_first: false,
        }
    }

    /// Sets the sort order for a single-column sort.
    #[must_use]
    pub fn order(mut self, order: SortOrder) -> Self {
        if let Some((_, o)) = self.columns.first_mut() {
            *o = order;
        }
        self
    }

    /// Sets whether nulls should appear first (default: false, nulls last).
    #[must_use]
    pub fn nulls_first(mut self, nulls_first: bool) -> Self {
        self.nulls_first = nulls_first;
        self
    }

    /// Returns the columns and their sort orders.
    pub fn columns(&self) -> &[(String, SortOrder)] {
        &self.columns
    }
}

impl Transform for Sort {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        use arrow::compute::{lexsort_to_indices, take, SortColumn, SortOptions};

        if batch.num_rows() <= 1 || self.columns.is_empty() {
            return Ok(batch);
        }

        let schema = batch.schema();

        // Build sort columns
        let sort_columns: Vec<SortColumn> = self
            .columns
            .iter()
            .map(|(col_name, order)| {
                let (idx, _) = schema
                    .column_with_name(col_name)
                    .ok_or_else(|| Error::column_not_found(col_name))?;

                Ok(SortColumn {
                    values: Arc::clone(batch.column(idx)),
                    options: Some(SortOptions {
                        descending: *order == SortOrder::Descending,
                        nulls_first: self.nulls_first,
                    }),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // Get sorted indices
        let indices = lexsort_to_indices(&sort_columns, None).map_err(Error::Arrow)?;

        // Reorder all columns
        let new_columns: Vec<Arc<dyn Array>> = (0..batch.num_columns())
            .map(|col_idx| {
                let col = batch.column(col_idx);
                take(col.as_ref(), &indices, None)
                    .map_err(Error::Arrow)
                    .map(Arc::from)
            })
            .collect::<Result<Vec<_>>>()?;

        RecordBatch::try_new(schema, new_columns).map_err(Error::Arrow)
    }
}

/// A transform that keeps rows whose value in a column lies within bounds.
///
/// Rows where the column is missing (or not a number) are removed, so a
/// bare `BoundsFilter::new(column)` doubles as a required-column filter.
/// Bounds are inclusive through [`at_least`](Self::at_least) /
/// [`at_most`](Self::at_most) and exclusive through
/// [`above`](Self::above) / [`below`](Self::below).
///
/// # Example
///
/// ```ignore
/// use refinar::BoundsFilter;
///
/// // Modeling prep: casting speed must be positive,
/// // temperature at least 1500 C
/// let speed_ok = BoundsFilter::new("speed").above(0.0);
/// let temp_ok = BoundsFilter::new("temperature").at_least(1500.0);
/// ```
#[derive(Debug, Clone)]
pub struct BoundsFilter {
    column: String,
    min: Option<f64>,
    max: Option<f64>,
    min_exclusive: bool,
    max_exclusive: bool,
}

impl BoundsFilter {
    /// Creates a filter with no bounds: only rows with a missing value in
    /// `column` are removed.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            min: None,
            max: None,
            min_exclusive: false,
            max_exclusive: false,
        }
    }

    /// Creates a filter keeping values in the closed range `[min, max]`.
    pub fn range(column: impl Into<String>, min: f64, max: f64) -> Self {
        Self::new(column).at_least(min).at_most(max)
    }

    /// Keeps rows with value `>= min`.
    #[must_use]
    pub fn at_least(mut self, min: f64) -> Self {
        self.min = Some(min);
        self.min_exclusive = false;
        self
    }

    /// Keeps rows with value `> min`.
    #[must_use]
    pub fn above(mut self, min: f64) -> Self {
        self.min = Some(min);
        self.min_exclusive = true;
        self
    }

    /// Keeps rows with value `<= max`.
    #[must_use]
    pub fn at_most(mut self, max: f64) -> Self {
        self.max = Some(max);
        self.max_exclusive = false;
        self
    }

    /// Keeps rows with value `< max`.
    #[must_use]
    pub fn below(mut self, max: f64) -> Self {
        self.max = Some(max);
        self.max_exclusive = true;
        self
    }

    /// Returns the filtered column name.
    pub fn column(&self) -> &str {
        &self.column
    }

    fn keeps(&self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }
        let min_ok = match self.min {
            None => true,
            Some(min) if self.min_exclusive => value > min,
            Some(min) => value >= min,
        };
        let max_ok = match self.max {
            None => true,
            Some(max) if self.max_exclusive => value < max,
            Some(max) => value <= max,
        };
        min_ok && max_ok
    }
}

impl Transform for BoundsFilter {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let values = stats::column_as_f64(&batch, &self.column)?;
        let mask: Vec<bool> = values
            .iter()
            .map(|v| matches!(v, Some(v) if self.keeps(v)))
            .collect();
        filter_record_batch(&batch, &BooleanArray::from(mask)).map_err(Error::Arrow)
    }
}

/// A transform that removes rows falling outside the IQR bounds of the
/// named columns.
///
/// Columns are screened sequentially: bounds for each column are computed
/// from the rows that survived the previous columns, matching how modeling
/// input was prepared in the plant pipeline. For each column, `Q1` and `Q3`
/// are taken over its non-missing values, and rows with a value outside
/// `[Q1 - factor*IQR, Q3 + factor*IQR]` (or with a missing value in that
/// column) are removed. A column with fewer than four non-missing values
/// establishes no bounds and is skipped.
///
/// This transform deletes rows, which is why it belongs to modeling prep
/// and not to table cleaning; cleaning nulls cells and keeps every row.
///
/// # Example
///
/// ```ignore
/// use refinar::IqrRowFilter;
///
/// let screen = IqrRowFilter::new(vec!["speed", "temperature", "Time_In_Ladle"]);
/// ```
#[derive(Debug, Clone)]
pub struct IqrRowFilter {
    columns: Vec<String>,
    factor: f64,
}

impl IqrRowFilter {
    /// Creates a filter over the given columns with the default factor 1.5.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            factor: 1.5,
        }
    }

    /// Sets the IQR multiplier.
    #[must_use]
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    /// Returns the screened columns.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the IQR multiplier.
    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl Transform for IqrRowFilter {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let mut current = batch;

        for column in &self.columns {
            let values = stats::column_as_f64(&current, column)?;
            let mut sorted = stats::non_missing(&values);
            sorted.sort_by(f64::total_cmp);

            let (lower, upper) = match stats::iqr_bounds(&sorted, self.factor) {
                Some(bounds) => bounds,
                None => continue,
            };

            let mask: Vec<bool> = values
                .iter()
                .map(|v| matches!(v, Some(v) if v >= lower && v <= upper))
                .collect();
            current =
                filter_record_batch(&current, &BooleanArray::from(mask)).map_err(Error::Arrow)?;
        }

        Ok(current)
    }
}
