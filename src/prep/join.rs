//! Keyed joins between plant tables.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray, UInt32Array, UInt64Array,
};
use arrow::compute::{concat, take};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::dataset::ArrowDataset;
use crate::error::{Error, Result};

/// How unmatched rows are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinHow {
    /// Keep only rows whose key exists on both sides.
    Inner,
    /// Keep every left row; right columns of unmatched rows are null.
    #[default]
    Left,
    /// Keep every row from both sides.
    Outer,
}

impl JoinHow {
    /// Name as written on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Self::Inner => "inner",
            Self::Left => "left",
            Self::Outer => "outer",
        }
    }
}

impl FromStr for JoinHow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "inner" => Ok(Self::Inner),
            "left" => Ok(Self::Left),
            "outer" => Ok(Self::Outer),
            _ => Err(Error::invalid_config(format!(
                "Unknown join type '{}', expected inner, left, or outer",
                s
            ))),
        }
    }
}

/// Hash equality join of two datasets on one or more key columns.
///
/// Key columns appear once in the output, at their left-side positions;
/// the remaining right-side columns follow in right schema order. A
/// non-key column name shared by both sides is an error, rename one
/// side first. Output order is deterministic: left rows in left order,
/// then (outer only) unmatched right rows in right order.
///
/// # Example
///
/// ```ignore
/// use refinar::{ArrowDataset, Join};
///
/// let products = ArrowDataset::from_csv("products.csv")?;
/// let vars = ArrowDataset::from_csv("vars_wide.csv")?;
/// let merged = Join::left(["REPORT_COUNTER", "PROD_COUNTER"])
///     .apply(&products, &vars)?;
/// ```
#[derive(Debug, Clone)]
pub struct Join {
    on: Vec<String>,
    how: JoinHow,
}

impl Join {
    /// Creates a join on the given key columns.
    pub fn new<S: Into<String>>(on: impl IntoIterator<Item = S>, how: JoinHow) -> Self {
        Self {
            on: on.into_iter().map(Into::into).collect(),
            how,
        }
    }

    /// Inner join on the given key columns.
    pub fn inner<S: Into<String>>(on: impl IntoIterator<Item = S>) -> Self {
        Self::new(on, JoinHow::Inner)
    }

    /// Left join on the given key columns.
    pub fn left<S: Into<String>>(on: impl IntoIterator<Item = S>) -> Self {
        Self::new(on, JoinHow::Left)
    }

    /// Outer join on the given key columns.
    pub fn outer<S: Into<String>>(on: impl IntoIterator<Item = S>) -> Self {
        Self::new(on, JoinHow::Outer)
    }

    /// Key column names.
    pub fn keys(&self) -> &[String] {
        &self.on
    }

    /// Join type.
    pub fn how(&self) -> JoinHow {
        self.how
    }

    /// Joins `left` with `right`.
    pub fn apply(&self, left: &ArrowDataset, right: &ArrowDataset) -> Result<ArrowDataset> {
        if self.on.is_empty() {
            return Err(Error::invalid_config("Join needs at least one key column"));
        }

        let left_batch = left.to_single_batch()?;
        let right_batch = right.to_single_batch()?;
        let left_schema = left_batch.schema();
        let right_schema = right_batch.schema();

        let left_keys = key_indices(&left_batch, &self.on)?;
        let right_keys = key_indices(&right_batch, &self.on)?;

        for (&l, &r) in left_keys.iter().zip(&right_keys) {
            let left_field = left_schema.field(l);
            let right_field = right_schema.field(r);
            if left_field.data_type() != right_field.data_type() {
                return Err(Error::schema_mismatch(format!(
                    "Join key '{}' is {:?} on the left and {:?} on the right",
                    left_field.name(),
                    left_field.data_type(),
                    right_field.data_type()
                )));
            }
        }
        for field in right_schema.fields() {
            if self.on.iter().any(|k| k == field.name()) {
                continue;
            }
            if left_schema.column_with_name(field.name()).is_some() {
                return Err(Error::schema_mismatch(format!(
                    "Column '{}' appears on both sides; rename or drop one before joining",
                    field.name()
                )));
            }
        }

        // Index right rows by key, preserving row order per key
        let mut by_key: HashMap<String, Vec<u64>> = HashMap::new();
        for row in 0..right_batch.num_rows() {
            by_key
                .entry(join_key(&right_batch, row, &right_keys)?)
                .or_default()
                .push(row as u64);
        }

        // Probe left rows in order; matched pairs and left-only rows
        // form the prefix, unmatched right rows the outer suffix
        let mut prefix_left: Vec<u64> = Vec::new();
        let mut prefix_right: Vec<Option<u64>> = Vec::new();
        let mut matched = vec![false; right_batch.num_rows()];

        for row in 0..left_batch.num_rows() {
            let key = join_key(&left_batch, row, &left_keys)?;
            match by_key.get(&key) {
                Some(rows) => {
                    for &r in rows {
                        prefix_left.push(row as u64);
                        prefix_right.push(Some(r));
                        matched[r as usize] = true;
                    }
                }
                None if self.how == JoinHow::Inner => {}
                None => {
                    prefix_left.push(row as u64);
                    prefix_right.push(None);
                }
            }
        }

        let suffix_right: Vec<u64> = if self.how == JoinHow::Outer {
            matched
                .iter()
                .enumerate()
                .filter(|&(_, seen)| !seen)
                .map(|(row, _)| row as u64)
                .collect()
        } else {
            Vec::new()
        };

        let left_full: UInt64Array = prefix_left
            .iter()
            .copied()
            .map(Some)
            .chain(suffix_right.iter().map(|_| None))
            .collect();
        let right_full: UInt64Array = prefix_right
            .iter()
            .copied()
            .chain(suffix_right.iter().copied().map(Some))
            .collect();
        let prefix_left = UInt64Array::from(prefix_left);
        let suffix_right = UInt64Array::from(suffix_right);

        let mut fields = Vec::new();
        let mut arrays: Vec<ArrayRef> = Vec::new();

        // Left columns in left order; key values coalesce across sides
        for (idx, field) in left_schema.fields().iter().enumerate() {
            let column = left_batch.column(idx);
            let array = match self.on.iter().position(|k| k == field.name()) {
                Some(key_pos) => {
                    let head = take(column.as_ref(), &prefix_left, None)?;
                    if suffix_right.is_empty() {
                        head
                    } else {
                        let right_column = right_batch.column(right_keys[key_pos]);
                        let tail = take(right_column.as_ref(), &suffix_right, None)?;
                        concat(&[head.as_ref(), tail.as_ref()])?
                    }
                }
                None => take(column.as_ref(), &left_full, None)?,
            };
            fields.push(Field::new(
                field.name(),
                field.data_type().clone(),
                field.is_nullable() || array.null_count() > 0,
            ));
            arrays.push(array);
        }

        for (idx, field) in right_schema.fields().iter().enumerate() {
            if self.on.iter().any(|k| k == field.name()) {
                continue;
            }
            let array = take(right_batch.column(idx).as_ref(), &right_full, None)?;
            fields.push(Field::new(
                field.name(),
                field.data_type().clone(),
                field.is_nullable() || array.null_count() > 0,
            ));
            arrays.push(array);
        }

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;
        ArrowDataset::from_batch(batch)
    }
}

fn key_indices(batch: &RecordBatch, on: &[String]) -> Result<Vec<usize>> {
    let schema = batch.schema();
    on.iter()
        .map(|name| {
            schema
                .column_with_name(name)
                .map(|(idx, _)| idx)
                .ok_or_else(|| Error::column_not_found(name))
        })
        .collect()
}

/// Renders one row's key columns as a single probe string. Nulls get a
/// fixed token, so a null key matches a null key; floats use their bit
/// pattern for exact comparison.
fn join_key(batch: &RecordBatch, row: usize, key_indices: &[usize]) -> Result<String> {
    let mut parts: Vec<String> = Vec::with_capacity(key_indices.len());

    for &col_idx in key_indices {
        let col = batch.column(col_idx);
        let part = if col.is_null(row) {
            "NULL".to_string()
        } else if let Some(arr) = col.as_any().downcast_ref::<Int32Array>() {
            arr.value(row).to_string()
        } else if let Some(arr) = col.as_any().downcast_ref::<Int64Array>() {
            arr.value(row).to_string()
        } else if let Some(arr) = col.as_any().downcast_ref::<UInt32Array>() {
            arr.value(row).to_string()
        } else if let Some(arr) = col.as_any().downcast_ref::<UInt64Array>() {
            arr.value(row).to_string()
        } else if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
            arr.value(row).to_bits().to_string()
        } else if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
            arr.value(row).to_bits().to_string()
        } else if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
            arr.value(row).to_string()
        } else if let Some(arr) = col.as_any().downcast_ref::<BooleanArray>() {
            arr.value(row).to_string()
        } else {
            return Err(Error::transform(format!(
                "Unsupported join key type {:?} for column '{}'",
                col.data_type(),
                batch.schema().field(col_idx).name()
            )));
        };
        parts.push(part);
    }

    Ok(parts.join("\x00"))
}
