//! Range-based outlier detection over numeric table columns.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use serde::Serialize;

use super::DomainThresholds;
use crate::dataset::ArrowDataset;
use crate::error::Result;
use crate::stats;

/// Strategy for deciding which values fall outside the expected range.
///
/// All three methods reduce to a `(lower, upper)` interval per column;
/// values strictly outside the interval are flagged, values on the
/// boundary are kept. Missing values (null or NaN) are never flagged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutlierMethod {
    /// Fixed engineering limits from a [`DomainThresholds`] table.
    /// Columns without a table entry get no result.
    Domain,
    /// Tukey fences at `factor` times the interquartile range beyond
    /// Q1 and Q3. Needs at least 4 non-missing values.
    Iqr {
        /// Fence multiplier, conventionally 1.5.
        factor: f64,
    },
    /// Interval of `threshold` population standard deviations around
    /// the mean. Needs more than 3 non-missing values.
    ZScore {
        /// Maximum absolute z-score considered in range, conventionally 3.
        threshold: f64,
    },
}

impl OutlierMethod {
    /// Conventional IQR fence multiplier.
    pub const DEFAULT_IQR_FACTOR: f64 = 1.5;
    /// Conventional z-score cutoff.
    pub const DEFAULT_ZSCORE_THRESHOLD: f64 = 3.0;

    /// IQR method with the conventional 1.5 factor.
    pub fn iqr() -> Self {
        Self::Iqr {
            factor: Self::DEFAULT_IQR_FACTOR,
        }
    }

    /// Z-score method with the conventional 3.0 threshold.
    pub fn zscore() -> Self {
        Self::ZScore {
            threshold: Self::DEFAULT_ZSCORE_THRESHOLD,
        }
    }

    /// Short name used in report and summary output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Iqr { .. } => "iqr",
            Self::ZScore { .. } => "zscore",
        }
    }
}

/// Outcome of one detection method on one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodResult {
    /// Smallest value still considered in range.
    pub lower_bound: f64,
    /// Largest value still considered in range.
    pub upper_bound: f64,
    /// Number of flagged values.
    pub outlier_count: usize,
    /// Row indices of flagged values, in row order.
    pub outlier_indices: Vec<usize>,
}

/// Per-column detection report with descriptive statistics.
///
/// A method that does not apply to the column (no threshold entry,
/// too few values) contributes `None` rather than a zero count, so a
/// reader can tell "checked, nothing found" from "not checked".
#[derive(Debug, Clone, Serialize)]
pub struct ColumnAnalysis {
    /// Column name.
    pub column: String,
    /// Total rows, including missing values.
    pub total_count: usize,
    /// Values that are neither null nor NaN.
    pub non_missing: usize,
    /// Null or NaN values.
    pub missing: usize,
    /// Mean of non-missing values.
    pub mean: Option<f64>,
    /// Median of non-missing values.
    pub median: Option<f64>,
    /// Sample standard deviation of non-missing values.
    pub std: Option<f64>,
    /// Smallest non-missing value.
    pub min: Option<f64>,
    /// Largest non-missing value.
    pub max: Option<f64>,
    /// Domain method result, when the column has a threshold entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<MethodResult>,
    /// IQR method result, when enough values are present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iqr: Option<MethodResult>,
    /// Z-score method result, when enough values are present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zscore: Option<MethodResult>,
}

impl ColumnAnalysis {
    /// Returns the result for a method, if it produced one.
    pub fn result(&self, method: OutlierMethod) -> Option<&MethodResult> {
        match method {
            OutlierMethod::Domain => self.domain.as_ref(),
            OutlierMethod::Iqr { .. } => self.iqr.as_ref(),
            OutlierMethod::ZScore { .. } => self.zscore.as_ref(),
        }
    }
}

/// Detection report for a whole table, one entry per numeric column.
#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    /// Analyses in schema order.
    pub columns: Vec<ColumnAnalysis>,
}

impl TableReport {
    /// Looks up the analysis for a column by name.
    pub fn get(&self, column: &str) -> Option<&ColumnAnalysis> {
        self.columns.iter().find(|c| c.column == column)
    }

    /// Sum of flagged values across all columns for a method.
    pub fn total_outliers(&self, method: OutlierMethod) -> usize {
        self.columns
            .iter()
            .filter_map(|c| c.result(method))
            .map(|r| r.outlier_count)
            .sum()
    }
}

/// Detects out-of-range values in the numeric columns of a dataset.
///
/// # Example
///
/// ```ignore
/// use refinar::{ArrowDataset, OutlierDetector};
///
/// let dataset = ArrowDataset::from_csv("lf_export.csv")?;
/// let report = OutlierDetector::new().analyze(&dataset)?;
/// for analysis in &report.columns {
///     if let Some(domain) = &analysis.domain {
///         println!("{}: {} out of range", analysis.column, domain.outlier_count);
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct OutlierDetector {
    thresholds: DomainThresholds,
    methods: Vec<OutlierMethod>,
}

impl Default for OutlierDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl OutlierDetector {
    /// Detector with the built-in threshold table and all three methods
    /// at their conventional parameters.
    pub fn new() -> Self {
        Self {
            thresholds: DomainThresholds::default(),
            methods: vec![
                OutlierMethod::Domain,
                OutlierMethod::iqr(),
                OutlierMethod::zscore(),
            ],
        }
    }

    /// Replaces the threshold table.
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: DomainThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Replaces the method list. Order determines summary column order.
    #[must_use]
    pub fn with_methods(mut self, methods: Vec<OutlierMethod>) -> Self {
        self.methods = methods;
        self
    }

    /// The threshold table in use.
    pub fn thresholds(&self) -> &DomainThresholds {
        &self.thresholds
    }

    /// The methods in use.
    pub fn methods(&self) -> &[OutlierMethod] {
        &self.methods
    }

    /// Analyzes every numeric column of the dataset.
    ///
    /// Non-numeric columns are skipped. Row indices in the report are
    /// global across batches.
    pub fn analyze(&self, dataset: &ArrowDataset) -> Result<TableReport> {
        let batch = dataset.to_single_batch()?;
        let mut columns = Vec::new();
        for field in batch.schema().fields() {
            if !stats::is_numeric(field.data_type()) {
                continue;
            }
            let values = stats::column_as_f64(&batch, field.name())?;
            columns.push(self.analyze_values(field.name(), &values));
        }
        Ok(TableReport { columns })
    }

    /// Analyzes a single column by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`](crate::Error::ColumnNotFound) when
    /// the column does not exist and a data error when it is not numeric.
    pub fn analyze_column(&self, dataset: &ArrowDataset, column: &str) -> Result<ColumnAnalysis> {
        let batch = dataset.to_single_batch()?;
        let values = stats::column_as_f64(&batch, column)?;
        Ok(self.analyze_values(column, &values))
    }

    /// Analyzes the whole dataset and folds the result into a summary
    /// table with one row per column: `column`, `non_missing`, `mean`,
    /// `median`, plus one `<method>_outliers` count column per configured
    /// method. Counts are null where the method did not apply.
    pub fn summary(&self, dataset: &ArrowDataset) -> Result<ArrowDataset> {
        let report = self.analyze(dataset)?;

        let mut fields = vec![
            Field::new("column", DataType::Utf8, false),
            Field::new("non_missing", DataType::UInt64, false),
            Field::new("mean", DataType::Float64, true),
            Field::new("median", DataType::Float64, true),
        ];
        let names: StringArray = report
            .columns
            .iter()
            .map(|c| Some(c.column.as_str()))
            .collect();
        let non_missing: UInt64Array = report
            .columns
            .iter()
            .map(|c| Some(c.non_missing as u64))
            .collect();
        let means: Float64Array = report.columns.iter().map(|c| c.mean).collect();
        let medians: Float64Array = report.columns.iter().map(|c| c.median).collect();
        let mut arrays: Vec<ArrayRef> = vec![
            Arc::new(names),
            Arc::new(non_missing),
            Arc::new(means),
            Arc::new(medians),
        ];

        for method in &self.methods {
            let counts: UInt64Array = report
                .columns
                .iter()
                .map(|c| c.result(*method).map(|r| r.outlier_count as u64))
                .collect();
            fields.push(Field::new(
                format!("{}_outliers", method.name()),
                DataType::UInt64,
                true,
            ));
            arrays.push(Arc::new(counts));
        }

        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema, arrays)?;
        ArrowDataset::from_batch(batch)
    }

    fn analyze_values(&self, column: &str, values: &Float64Array) -> ColumnAnalysis {
        let total_count = values.len();
        let present = stats::non_missing(values);
        let non_missing = present.len();

        let mut sorted = present.clone();
        sorted.sort_by(f64::total_cmp);

        let mean = stats::mean(&present);
        let std = mean.and_then(|m| stats::sample_std(&present, m));

        let mut analysis = ColumnAnalysis {
            column: column.to_string(),
            total_count,
            non_missing,
            missing: total_count - non_missing,
            mean,
            median: stats::quantile_sorted(&sorted, 0.5),
            std,
            min: sorted.first().copied(),
            max: sorted.last().copied(),
            domain: None,
            iqr: None,
            zscore: None,
        };

        for method in &self.methods {
            match method {
                OutlierMethod::Domain => {
                    if let Some((lower, upper)) = self.thresholds.get(column) {
                        analysis.domain = Some(method_result(values, lower, upper));
                    }
                }
                OutlierMethod::Iqr { factor } => {
                    if let Some((lower, upper)) = stats::iqr_bounds(&sorted, *factor) {
                        analysis.iqr = Some(method_result(values, lower, upper));
                    }
                }
                OutlierMethod::ZScore { threshold } => {
                    if non_missing <= 3 {
                        continue;
                    }
                    let Some(m) = mean else { continue };
                    let Some(s) = stats::population_std(&present, m) else {
                        continue;
                    };
                    let lower = m - threshold * s;
                    let upper = m + threshold * s;
                    // Degenerate spread: report the bounds, flag nothing.
                    let mut result = method_result(values, lower, upper);
                    if !(s > 0.0 && s.is_finite()) {
                        result.outlier_count = 0;
                        result.outlier_indices.clear();
                    }
                    analysis.zscore = Some(result);
                }
            }
        }

        analysis
    }
}

fn method_result(values: &Float64Array, lower: f64, upper: f64) -> MethodResult {
    let outlier_indices = flag_outside(values, lower, upper);
    MethodResult {
        lower_bound: lower,
        upper_bound: upper,
        outlier_count: outlier_indices.len(),
        outlier_indices,
    }
}

/// Indices of non-missing values strictly outside `[lower, upper]`.
fn flag_outside(values: &Float64Array, lower: f64, upper: f64) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter_map(|(idx, value)| match value {
            Some(v) if !v.is_nan() && (v < lower || v > upper) => Some(idx),
            _ => None,
        })
        .collect()
}
