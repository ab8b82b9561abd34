//! Wide extraction from the long-format variable table.

use arrow::array::BooleanArray;
use arrow::compute::filter_record_batch;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use super::Join;
use crate::dataset::ArrowDataset;
use crate::error::{Error, Result};
use crate::stats;
use crate::transform::{Cast, Rename, Select, Transform};

/// Reshapes the machine historian's variable table into wide columns.
///
/// The historian stores one row per `(report, product, variable)` with
/// the reading in `AVG_VALUE` and a code telling actual values apart
/// from setpoints. For each configured `(variable id, name)` pair this
/// extracts the rows with the wanted value code and turns them into one
/// Float64 column, outer-joined on the key columns so a key present for
/// any variable yields a row.
///
/// # Example
///
/// ```ignore
/// use refinar::{ArrowDataset, VariablePivot};
///
/// let long = ArrowDataset::from_csv("maschinendaten.csv")?;
/// let wide = VariablePivot::casting_defaults().apply(&long)?;
/// // wide: REPORT_COUNTER, PROD_COUNTER, speed, temperature
/// ```
#[derive(Debug, Clone)]
pub struct VariablePivot {
    variables: Vec<(i64, String)>,
    value_code: i64,
}

impl VariablePivot {
    /// Report key column of the long table.
    pub const REPORT_KEY: &'static str = "REPORT_COUNTER";
    /// Product key column of the long table.
    pub const PRODUCT_KEY: &'static str = "PROD_COUNTER";

    const VARIABLE_ID: &'static str = "VARIABLE_ID";
    const VALUE_CODE: &'static str = "VALUE_CODE";
    const AVG_VALUE: &'static str = "AVG_VALUE";

    /// Pivot for the given `(variable id, output column)` pairs,
    /// keeping value code 1 ("actual value").
    pub fn new<S: Into<String>>(variables: impl IntoIterator<Item = (i64, S)>) -> Self {
        Self {
            variables: variables
                .into_iter()
                .map(|(id, name)| (id, name.into()))
                .collect(),
            value_code: 1,
        }
    }

    /// Casting-machine defaults: variable 13 is the casting speed,
    /// variable 45 the tundish temperature.
    pub fn casting_defaults() -> Self {
        Self::new([(13, "speed"), (45, "temperature")])
    }

    /// Keeps rows with this value code instead of the default 1.
    #[must_use]
    pub fn with_value_code(mut self, code: i64) -> Self {
        self.value_code = code;
        self
    }

    /// Configured `(variable id, output column)` pairs.
    pub fn variables(&self) -> &[(i64, String)] {
        &self.variables
    }

    /// Pivots the long table into one row per key.
    pub fn apply(&self, dataset: &ArrowDataset) -> Result<ArrowDataset> {
        if self.variables.is_empty() {
            return Err(Error::invalid_config(
                "VariablePivot needs at least one variable id",
            ));
        }

        let batch = dataset.to_single_batch()?;
        let join = Join::outer([Self::REPORT_KEY, Self::PRODUCT_KEY]);

        let (first_id, first_name) = &self.variables[0];
        let mut wide = ArrowDataset::from_batch(self.extract(&batch, *first_id, first_name)?)?;
        for (id, name) in &self.variables[1..] {
            let next = ArrowDataset::from_batch(self.extract(&batch, *id, name)?)?;
            wide = join.apply(&wide, &next)?;
        }
        Ok(wide)
    }

    /// One variable's rows as `(report, product, <name>)` with the
    /// reading cast to Float64.
    fn extract(&self, batch: &RecordBatch, id: i64, name: &str) -> Result<RecordBatch> {
        let ids = stats::column_as_f64(batch, Self::VARIABLE_ID)?;
        let codes = stats::column_as_f64(batch, Self::VALUE_CODE)?;
        let wanted_id = id as f64;
        let wanted_code = self.value_code as f64;

        let mask: Vec<bool> = ids
            .iter()
            .zip(codes.iter())
            .map(|(id, code)| {
                matches!((id, code), (Some(i), Some(c)) if i == wanted_id && c == wanted_code)
            })
            .collect();
        let rows = filter_record_batch(batch, &BooleanArray::from(mask))?;

        let rows = Select::new([Self::REPORT_KEY, Self::PRODUCT_KEY, Self::AVG_VALUE]).apply(rows)?;
        let rows = Rename::from_pairs([(Self::AVG_VALUE, name)]).apply(rows)?;
        Cast::single(name, DataType::Float64).apply(rows)
    }
}
