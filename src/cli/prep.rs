//! Table preparation CLI commands.

use std::path::PathBuf;

use clap::Subcommand;

use crate::prep::{self, GradeFilter, Join, JoinHow, VariablePivot, YearFilter};
use crate::transform::Transform;
use crate::{ArrowDataset, Dataset};

use super::basic::{load_dataset, save_dataset};

/// Table preparation commands.
#[derive(Subcommand)]
pub enum PrepCommands {
    /// Pivot and join the three casting exports into one wide table
    Merge {
        /// Long-format variable measurements file
        vars: PathBuf,
        /// Product records file
        products: PathBuf,
        /// Heat records file
        heats: PathBuf,
        /// Output file for the merged table
        #[arg(short, long)]
        output: PathBuf,
        /// Variable to pivot as id=name, repeatable (default: 13=speed 45=temperature)
        #[arg(long)]
        variable: Vec<String>,
        /// Value code to keep when pivoting
        #[arg(long, default_value = "1")]
        value_code: i64,
    },
    /// Keep rows matching a steel grade and/or a calendar year
    Filter {
        /// Path to dataset file
        path: PathBuf,
        /// Output file for the filtered table
        #[arg(short, long)]
        output: PathBuf,
        /// Column holding the steel grade name
        #[arg(long, default_value = GradeFilter::DEFAULT_COLUMN)]
        grade_column: String,
        /// Grade substring to match, case-insensitive
        #[arg(long)]
        grade: Option<String>,
        /// Column holding the heat start date
        #[arg(long, default_value = "START_DATE")]
        date_column: String,
        /// Calendar year to keep
        #[arg(long)]
        year: Option<i32>,
    },
    /// Join two tables on key columns
    Join {
        /// Left table file
        left: PathBuf,
        /// Right table file
        right: PathBuf,
        /// Comma-separated key columns
        #[arg(long)]
        on: String,
        /// Join type (inner, left, outer)
        #[arg(long, default_value = "left")]
        how: String,
        /// Output file for the joined table
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Parse repeated `id=name` pivot specs.
fn parse_variables(specs: &[String]) -> crate::Result<Vec<(i64, String)>> {
    specs
        .iter()
        .map(|spec| {
            let (id, name) = spec.split_once('=').ok_or_else(|| {
                crate::Error::invalid_config(format!("Expected id=name, got '{}'", spec))
            })?;
            let id = id.trim().parse::<i64>().map_err(|_| {
                crate::Error::invalid_config(format!("Variable id '{}' is not an integer", id))
            })?;
            Ok((id, name.trim().to_string()))
        })
        .collect()
}

/// Run the pivot-and-join flow over the three casting exports.
pub(crate) fn cmd_merge(
    vars: &PathBuf,
    products: &PathBuf,
    heats: &PathBuf,
    output: &PathBuf,
    variable: &[String],
    value_code: i64,
) -> crate::Result<()> {
    let vars_ds = load_dataset(vars)?;
    let products_ds = load_dataset(products)?;
    let heats_ds = load_dataset(heats)?;

    let pivot = if variable.is_empty() {
        VariablePivot::casting_defaults()
    } else {
        VariablePivot::new(parse_variables(variable)?)
    };
    let pivot = pivot.with_value_code(value_code);

    let merged = prep::merge_casting_tables(&vars_ds, &products_ds, &heats_ds, &pivot)?;
    save_dataset(&merged, output)?;

    println!(
        "Merged {} rows x {} columns -> {}",
        merged.len(),
        merged.schema().fields().len(),
        output.display()
    );

    Ok(())
}

/// Filter a table by steel grade and/or year.
pub(crate) fn cmd_filter(
    path: &PathBuf,
    output: &PathBuf,
    grade_column: &str,
    grade: Option<&str>,
    date_column: &str,
    year: Option<i32>,
) -> crate::Result<()> {
    if grade.is_none() && year.is_none() {
        return Err(crate::Error::invalid_config(
            "Nothing to filter: pass --grade and/or --year",
        ));
    }

    let dataset = load_dataset(path)?;
    let before = dataset.len();
    let mut batch = dataset.to_single_batch()?;

    if let Some(pattern) = grade {
        batch = GradeFilter::new(grade_column, pattern).apply(batch)?;
    }
    if let Some(year) = year {
        batch = YearFilter::new(date_column, year).apply(batch)?;
    }

    let filtered = ArrowDataset::from_batch(batch)?;
    save_dataset(&filtered, output)?;

    println!(
        "Kept {} of {} rows -> {}",
        filtered.len(),
        before,
        output.display()
    );

    Ok(())
}

/// Join two tables on key columns.
pub(crate) fn cmd_join(
    left: &PathBuf,
    right: &PathBuf,
    on: &str,
    how: &str,
    output: &PathBuf,
) -> crate::Result<()> {
    let how: JoinHow = how.parse()?;
    let keys: Vec<&str> = on
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if keys.is_empty() {
        return Err(crate::Error::invalid_config(
            "--on needs at least one key column",
        ));
    }

    let left_ds = load_dataset(left)?;
    let right_ds = load_dataset(right)?;

    let joined = Join::new(keys, how).apply(&left_ds, &right_ds)?;
    save_dataset(&joined, output)?;

    println!(
        "Joined {} ({} rows) with {} ({} rows) -> {} ({} rows, {} join)",
        left.display(),
        left_ds.len(),
        right.display(),
        right_ds.len(),
        output.display(),
        joined.len(),
        how.name()
    );

    Ok(())
}
