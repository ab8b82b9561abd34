//! Numeric and temporal column transforms.

use std::sync::Arc;

use arrow::{
    array::{Array, ArrayRef, Float64Array, RecordBatch, TimestampMillisecondArray},
    compute::cast_with_options,
    datatypes::{DataType, Field, Schema, TimeUnit},
};

use super::Transform;
use crate::{
    error::{Error, Result},
    stats,
};

/// A transform that casts columns to different data types.
///
/// Casting is coercing: a value that cannot be represented in the target
/// type becomes null instead of aborting the pipeline. Plant exports
/// routinely carry stray text in numeric columns, so cast columns are
/// marked nullable whenever the cast introduces nulls. Casting between
/// unsupported type pairs still returns an error.
///
/// # Example
///
/// ```ignore
/// use arrow::datatypes::DataType;
/// use refinar::Cast;
///
/// let cast = Cast::new(vec![
///     ("tieu_thu_dien", DataType::Float64),
///     ("REPORT_COUNTER", DataType::Int64),
/// ]);
/// ```
#[derive(Debug, Clone)]
pub struct Cast {
    mappings: Vec<(String, DataType)>,
}

impl Cast {
    /// Creates a new Cast transform with column-to-type mappings.
    pub fn new<S: Into<String>>(mappings: impl IntoIterator<Item = (S, DataType)>) -> Self {
        Self {
            mappings: mappings
                .into_iter()
                .map(|(name, dtype)| (name.into(), dtype))
                .collect(),
        }
    }

    /// Creates a Cast transform for a single column.
    pub fn single(column: impl Into<String>, to_type: DataType) -> Self {
        Self::new([(column.into(), to_type)])
    }

    /// Returns the cast mappings.
    pub fn mappings(&self) -> &[(String, DataType)] {
        &self.mappings
    }
}

impl Transform for Cast {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let schema = batch.schema();
        let cast_map: std::collections::HashMap<&str, &DataType> =
            self.mappings.iter().map(|(n, t)| (n.as_str(), t)).collect();

        let mut fields = Vec::with_capacity(schema.fields().len());
        let mut arrays = Vec::with_capacity(schema.fields().len());

        for (idx, field) in schema.fields().iter().enumerate() {
            let col = batch.column(idx);

            if let Some(&target_type) = cast_map.get(field.name().as_str()) {
                let casted =
                    cast_with_options(col.as_ref(), target_type, &stats::coercing_options())
                        .map_err(|e| {
                            Error::transform(format!(
                                "Failed to cast column '{}' to {:?}: {}",
                                field.name(),
                                target_type,
                                e
                            ))
                        })?;
                let nullable = field.is_nullable() || casted.null_count() > 0;
                fields.push(Field::new(field.name(), target_type.clone(), nullable));
                arrays.push(casted);
            } else {
                fields.push(field.as_ref().clone());
                arrays.push(Arc::clone(col));
            }
        }

        let new_schema = Arc::new(Schema::new(fields));
        RecordBatch::try_new(new_schema, arrays).map_err(Error::Arrow)
    }
}

/// A transform that computes the row-wise difference of two numeric columns.
///
/// The result is written to `output` as a nullable Float64 column: replaced
/// in place when a column of that name already exists, appended otherwise.
/// Rows where either input is missing produce a missing result.
///
/// This is how `temp_loss` is derived from the ladle furnace temperatures:
///
/// ```ignore
/// use refinar::Difference;
///
/// let temp_loss = Difference::new("nhiet_do_vao_tl", "nhiet_do_ra_thep", "temp_loss");
/// ```
#[derive(Debug, Clone)]
pub struct Difference {
    minuend: String,
    subtrahend: String,
    output: String,
}

impl Difference {
    /// Creates a new Difference transform computing `minuend - subtrahend`.
    pub fn new(
        minuend: impl Into<String>,
        subtrahend: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            minuend: minuend.into(),
            subtrahend: subtrahend.into(),
            output: output.into(),
        }
    }

    /// Returns the name of the output column.
    pub fn output(&self) -> &str {
        &self.output
    }
}

impl Transform for Difference {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let minuend = stats::column_as_f64(&batch, &self.minuend)?;
        let subtrahend = stats::column_as_f64(&batch, &self.subtrahend)?;

        let diff: Float64Array = minuend
            .iter()
            .zip(subtrahend.iter())
            .map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => Some(a - b),
                _ => None,
            })
            .collect();

        upsert_column(batch, &self.output, Arc::new(diff))
    }
}

/// A transform that computes elapsed minutes between two temporal columns.
///
/// Both columns are cast to millisecond timestamps first, so date, timestamp,
/// and string-encoded columns all work. Rows where either endpoint is missing
/// or unparseable produce a missing result. The elapsed time is written to
/// `output` as a nullable Float64 column, replaced in place when present and
/// appended otherwise. Negative durations are kept as-is; filter them
/// downstream when the process requires a positive duration.
///
/// # Example
///
/// ```ignore
/// use refinar::ElapsedMinutes;
///
/// let ladle_time = ElapsedMinutes::new("START_DATE", "CUT_DATE", "Time_In_Ladle");
/// ```
#[derive(Debug, Clone)]
pub struct ElapsedMinutes {
    start: String,
    end: String,
    output: String,
}

impl ElapsedMinutes {
    /// Creates a new ElapsedMinutes transform computing `end - start` in minutes.
    pub fn new(
        start: impl Into<String>,
        end: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            output: output.into(),
        }
    }

    /// Returns the name of the output column.
    pub fn output(&self) -> &str {
        &self.output
    }
}

impl Transform for ElapsedMinutes {
    #[allow(clippy::cast_precision_loss)]
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let start = timestamp_column(&batch, &self.start)?;
        let end = timestamp_column(&batch, &self.end)?;

        let elapsed: Float64Array = start
            .iter()
            .zip(end.iter())
            .map(|(s, e)| match (s, e) {
                (Some(s), Some(e)) => Some((e - s) as f64 / 60_000.0),
                _ => None,
            })
            .collect();

        upsert_column(batch, &self.output, Arc::new(elapsed))
    }
}

/// Extracts a column as millisecond timestamps, coercing unparseable values
/// to null.
fn timestamp_column(batch: &RecordBatch, name: &str) -> Result<TimestampMillisecondArray> {
    let schema = batch.schema();
    let (idx, _) = schema
        .column_with_name(name)
        .ok_or_else(|| Error::column_not_found(name))?;

    let ts_array = cast_with_options(
        batch.column(idx).as_ref(),
        &DataType::Timestamp(TimeUnit::Millisecond, None),
        &stats::coercing_options(),
    )
    .map_err(|e| Error::transform(format!("Column '{}' is not temporal: {}", name, e)))?;

    ts_array
        .as_any()
        .downcast_ref::<TimestampMillisecondArray>()
        .cloned()
        .ok_or_else(|| Error::transform("Expected TimestampMillisecondArray after cast"))
}

/// Replaces the named column in place, or appends it when absent.
fn upsert_column(batch: RecordBatch, name: &str, array: ArrayRef) -> Result<RecordBatch> {
    let schema = batch.schema();
    let field = Field::new(name, array.data_type().clone(), true);

    let mut fields: Vec<Field> = Vec::with_capacity(schema.fields().len() + 1);
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len() + 1);
    let mut replaced = false;

    for (idx, existing) in schema.fields().iter().enumerate() {
        if existing.name() == name {
            fields.push(field.clone());
            arrays.push(Arc::clone(&array));
            replaced = true;
        } else {
            fields.push(existing.as_ref().clone());
            arrays.push(Arc::clone(batch.column(idx)));
        }
    }

    if !replaced {
        fields.push(field);
        arrays.push(array);
    }

    let new_schema = Arc::new(Schema::new(fields));
    RecordBatch::try_new(new_schema, arrays).map_err(Error::Arrow)
}

#[cfg(test)]
#[allow(clippy::float_cmp, clippy::redundant_closure)]
mod tests {
    use arrow::array::{Int64Array, StringArray};

    use super::*;

    fn temperature_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("heat_id", DataType::Int64, false),
            Field::new("nhiet_do_vao_tl", DataType::Float64, true),
            Field::new("nhiet_do_ra_thep", DataType::Float64, true),
        ]));

        let heat = Int64Array::from(vec![1, 2, 3, 4]);
        let inlet = Float64Array::from(vec![Some(1650.0), Some(1655.0), None, Some(1662.0)]);
        let outlet = Float64Array::from(vec![Some(1610.0), Some(1620.0), Some(1605.0), None]);

        RecordBatch::try_new(
            schema,
            vec![Arc::new(heat), Arc::new(inlet), Arc::new(outlet)],
        )
        .ok()
        .unwrap_or_else(|| panic!("Should create batch"))
    }

    #[test]
    fn test_cast_transform() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("heat_id", DataType::Int64, false),
            Field::new("tieu_thu_dien", DataType::Int64, false),
        ]));
        let heat = Int64Array::from(vec![1, 2, 3]);
        let power = Int64Array::from(vec![4200, 4150, 4380]);
        let batch = RecordBatch::try_new(schema, vec![Arc::new(heat), Arc::new(power)])
            .ok()
            .unwrap_or_else(|| panic!("Should create batch"));

        let transform = Cast::new(vec![("tieu_thu_dien", DataType::Float64)]);
        let result = transform.apply(batch);
        assert!(result.is_ok());
        let result = result.ok().unwrap_or_else(|| panic!("Should succeed"));

        assert_eq!(result.schema().field(0).data_type(), &DataType::Int64);
        assert_eq!(result.schema().field(1).data_type(), &DataType::Float64);
    }

    #[test]
    fn test_cast_preserves_values() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            "Canxi",
            DataType::Int64,
            false,
        )]));
        let batch = RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![120, 95]))])
            .ok()
            .unwrap_or_else(|| panic!("Should create batch"));

        let transform = Cast::single("Canxi", DataType::Float64);
        let result = transform
            .apply(batch)
            .ok()
            .unwrap_or_else(|| panic!("Should succeed"));

        let col = result
            .column(0)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap_or_else(|| panic!("Should be Float64Array"));
        assert_eq!(col.value(0), 120.0);
        assert_eq!(col.value(1), 95.0);
    }

    #[test]
    fn test_cast_unparseable_becomes_null() {
        let schema = Arc::new(Schema::new(vec![Field::new("Al", DataType::Utf8, false)]));
        let array = StringArray::from(vec!["120.5", "n/a", "98.0"]);
        let batch = RecordBatch::try_new(schema, vec![Arc::new(array)])
            .ok()
            .unwrap_or_else(|| panic!("Should create batch"));

        let transform = Cast::single("Al", DataType::Float64);
        let result = transform
            .apply(batch)
            .ok()
            .unwrap_or_else(|| panic!("Should succeed"));

        let col = result
            .column(0)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap_or_else(|| panic!("Should be Float64Array"));
        assert_eq!(col.value(0), 120.5);
        assert!(col.is_null(1));
        assert!(result.schema().field(0).is_nullable());
    }

    #[test]
    fn test_cast_nonexistent_column_is_noop() {
        let batch = temperature_batch();
        let transform = Cast::single("nonexistent", DataType::Float64);
        let result = transform.apply(batch.clone());
        assert!(result.is_ok());
        let result = result.ok().unwrap_or_else(|| panic!("Should succeed"));
        assert_eq!(result.num_rows(), batch.num_rows());
    }

    #[test]
    fn test_cast_mappings_getter() {
        let transform = Cast::new(vec![("a", DataType::Int64)]);
        assert_eq!(transform.mappings().len(), 1);
        assert_eq!(transform.mappings()[0].0, "a");
        assert_eq!(transform.mappings()[0].1, DataType::Int64);
    }

    #[test]
    fn test_difference_appends_output() {
        let batch = temperature_batch();
        let transform = Difference::new("nhiet_do_vao_tl", "nhiet_do_ra_thep", "temp_loss");
        let result = transform
            .apply(batch)
            .ok()
            .unwrap_or_else(|| panic!("Should succeed"));

        assert_eq!(result.num_columns(), 4);
        assert_eq!(result.schema().field(3).name(), "temp_loss");

        let loss = result
            .column(3)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap_or_else(|| panic!("Should be Float64Array"));
        assert_eq!(loss.value(0), 40.0);
        assert_eq!(loss.value(1), 35.0);
        assert!(loss.is_null(2)); // Missing inlet
        assert!(loss.is_null(3)); // Missing outlet
    }

    #[test]
    fn test_difference_overwrites_in_place() {
        let batch = temperature_batch();
        let transform = Difference::new("nhiet_do_vao_tl", "nhiet_do_ra_thep", "temp_loss");
        let once = transform
            .apply(batch)
            .ok()
            .unwrap_or_else(|| panic!("Should succeed"));
        let twice = transform
            .apply(once)
            .ok()
            .unwrap_or_else(|| panic!("Should succeed"));

        // Second application overwrites rather than duplicating the column
        assert_eq!(twice.num_columns(), 4);
        assert_eq!(twice.schema().field(3).name(), "temp_loss");
    }

    #[test]
    fn test_difference_missing_column() {
        let batch = temperature_batch();
        let transform = Difference::new("nhiet_do_vao_tl", "nhiet_do_lan_1", "delta");
        assert!(transform.apply(batch).is_err());
    }

    #[test]
    fn test_difference_output_getter() {
        let transform = Difference::new("a", "b", "a_minus_b");
        assert_eq!(transform.output(), "a_minus_b");
    }

    #[test]
    fn test_elapsed_minutes() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(
                "START_DATE",
                DataType::Timestamp(TimeUnit::Millisecond, None),
                true,
            ),
            Field::new(
                "CUT_DATE",
                DataType::Timestamp(TimeUnit::Millisecond, None),
                true,
            ),
        ]));
        let start = TimestampMillisecondArray::from(vec![Some(0), Some(600_000), None]);
        let end = TimestampMillisecondArray::from(vec![Some(2_730_000), Some(300_000), Some(1)]);
        let batch = RecordBatch::try_new(schema, vec![Arc::new(start), Arc::new(end)])
            .ok()
            .unwrap_or_else(|| panic!("Should create batch"));

        let transform = ElapsedMinutes::new("START_DATE", "CUT_DATE", "Time_In_Ladle");
        let result = transform
            .apply(batch)
            .ok()
            .unwrap_or_else(|| panic!("Should succeed"));

        let elapsed = result
            .column(2)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap_or_else(|| panic!("Should be Float64Array"));
        assert_eq!(elapsed.value(0), 45.5);
        assert_eq!(elapsed.value(1), -5.0); // Negative durations kept
        assert!(elapsed.is_null(2));
    }

    #[test]
    fn test_elapsed_minutes_from_strings() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("START_DATE", DataType::Utf8, true),
            Field::new("CUT_DATE", DataType::Utf8, true),
        ]));
        let start = StringArray::from(vec![Some("2025-03-01T08:00:00"), Some("bad date")]);
        let end = StringArray::from(vec![
            Some("2025-03-01T08:45:30"),
            Some("2025-03-01T09:00:00"),
        ]);
        let batch = RecordBatch::try_new(schema, vec![Arc::new(start), Arc::new(end)])
            .ok()
            .unwrap_or_else(|| panic!("Should create batch"));

        let transform = ElapsedMinutes::new("START_DATE", "CUT_DATE", "elapsed_min");
        let result = transform
            .apply(batch)
            .ok()
            .unwrap_or_else(|| panic!("Should succeed"));

        let elapsed = result
            .column(2)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap_or_else(|| panic!("Should be Float64Array"));
        assert_eq!(elapsed.value(0), 45.5);
        assert!(elapsed.is_null(1)); // Unparseable start
    }
}
