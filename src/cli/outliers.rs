//! Outlier detection and cleaning CLI commands.

use std::path::{Path, PathBuf};

use arrow::util::pretty::print_batches;
use clap::Subcommand;

use crate::Dataset;
use crate::outlier::{
    DomainThresholds, MethodResult, OutlierCleaner, OutlierDetector, OutlierMethod, TableReport,
    mean_shift,
};

use super::basic::{load_dataset, save_dataset};

/// Outlier detection and cleaning commands.
#[derive(Subcommand)]
pub enum OutlierCommands {
    /// Analyze numeric columns and report out-of-range values
    Analyze {
        /// Path to dataset file
        path: PathBuf,
        /// IQR fence multiplier
        #[arg(long, default_value = "1.5")]
        factor: f64,
        /// Z-score cutoff
        #[arg(long, default_value = "3.0")]
        zscore_threshold: f64,
        /// JSON file with per-column [lower, upper] ranges
        #[arg(long)]
        thresholds: Option<PathBuf>,
        /// Comma-separated methods to run (domain, iqr, zscore)
        #[arg(long, default_value = "domain,iqr,zscore")]
        methods: String,
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Print a one-row-per-column summary table
    Summary {
        /// Path to dataset file
        path: PathBuf,
        /// IQR fence multiplier
        #[arg(long, default_value = "1.5")]
        factor: f64,
        /// Z-score cutoff
        #[arg(long, default_value = "3.0")]
        zscore_threshold: f64,
        /// JSON file with per-column [lower, upper] ranges
        #[arg(long)]
        thresholds: Option<PathBuf>,
        /// Comma-separated methods to run (domain, iqr, zscore)
        #[arg(long, default_value = "domain,iqr,zscore")]
        methods: String,
        /// Also write the summary table to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace out-of-range cells with nulls and write the cleaned table
    Clean {
        /// Path to dataset file
        path: PathBuf,
        /// Output file for the cleaned table
        #[arg(short, long)]
        output: PathBuf,
        /// Cleaning method (domain, iqr)
        #[arg(long, default_value = "domain")]
        method: String,
        /// IQR fence multiplier
        #[arg(long, default_value = "1.5")]
        factor: f64,
        /// JSON file with per-column [lower, upper] ranges
        #[arg(long)]
        thresholds: Option<PathBuf>,
        /// Print before/after means for the columns that changed
        #[arg(long)]
        compare: bool,
    },
}

/// Parse a comma-separated method list into detector methods.
fn parse_methods(
    spec: &str,
    factor: f64,
    zscore_threshold: f64,
) -> crate::Result<Vec<OutlierMethod>> {
    let mut methods = Vec::new();

    for name in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match name {
            "domain" => methods.push(OutlierMethod::Domain),
            "iqr" => methods.push(OutlierMethod::Iqr { factor }),
            "zscore" => methods.push(OutlierMethod::ZScore {
                threshold: zscore_threshold,
            }),
            other => {
                return Err(crate::Error::invalid_config(format!(
                    "Unknown method '{}', expected domain, iqr, or zscore",
                    other
                )));
            }
        }
    }

    if methods.is_empty() {
        return Err(crate::Error::invalid_config("No outlier methods selected"));
    }

    Ok(methods)
}

/// Load a threshold table from a JSON file, or fall back to the built-in
/// ladle furnace table.
fn load_thresholds(path: Option<&Path>) -> crate::Result<DomainThresholds> {
    match path {
        Some(path) => DomainThresholds::from_json_file(path),
        None => Ok(DomainThresholds::default()),
    }
}

/// Format an optional statistic for table output.
fn fmt_stat(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

/// Format an optional method result as an outlier count.
fn fmt_count(result: Option<&MethodResult>) -> String {
    result.map_or_else(|| "-".to_string(), |r| r.outlier_count.to_string())
}

/// Analyze numeric columns and report out-of-range values.
pub(crate) fn cmd_analyze(
    path: &PathBuf,
    factor: f64,
    zscore_threshold: f64,
    thresholds: Option<&Path>,
    methods: &str,
    format: &str,
) -> crate::Result<()> {
    let dataset = load_dataset(path)?;
    let methods = parse_methods(methods, factor, zscore_threshold)?;
    let detector = OutlierDetector::new()
        .with_thresholds(load_thresholds(thresholds)?)
        .with_methods(methods.clone());

    let report = detector.analyze(&dataset)?;

    if format == "json" {
        let totals: std::collections::BTreeMap<_, _> = methods
            .iter()
            .map(|m| (m.name().to_string(), report.total_outliers(*m)))
            .collect();
        let json = serde_json::json!({
            "path": path.display().to_string(),
            "rows": dataset.len(),
            "columns_analyzed": report.columns.len(),
            "total_outliers": totals,
            "columns": report.columns,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).map_err(|e| crate::Error::data(e.to_string()))?
        );
    } else {
        print_report(path, dataset.len(), &report, &methods);
    }

    Ok(())
}

/// Print the text form of an analysis report.
fn print_report(path: &Path, rows: usize, report: &TableReport, methods: &[OutlierMethod]) {
    println!("Outlier Report");
    println!("==============");
    println!("File: {}", path.display());
    println!("Rows: {}", rows);
    println!("Numeric columns: {}", report.columns.len());
    println!();

    println!("Method totals:");
    for method in methods {
        println!("  {}: {}", method.name(), report.total_outliers(*method));
    }
    println!();

    println!(
        "{:<24} {:>8} {:>8} {:>10} {:>8} {:>8} {:>8}",
        "COLUMN", "VALUES", "MISSING", "MEAN", "DOMAIN", "IQR", "ZSCORE"
    );
    println!("{}", "-".repeat(80));

    for analysis in &report.columns {
        println!(
            "{:<24} {:>8} {:>8} {:>10} {:>8} {:>8} {:>8}",
            analysis.column,
            analysis.non_missing,
            analysis.missing,
            fmt_stat(analysis.mean),
            fmt_count(analysis.domain.as_ref()),
            fmt_count(analysis.iqr.as_ref()),
            fmt_count(analysis.zscore.as_ref()),
        );
    }

    let mut flagged = Vec::new();
    for analysis in &report.columns {
        for method in methods {
            if let Some(result) = analysis.result(*method) {
                if result.outlier_count > 0 {
                    flagged.push((analysis.column.as_str(), method.name(), result));
                }
            }
        }
    }

    if !flagged.is_empty() {
        println!();
        println!("Flagged columns:");
        for (column, method, result) in flagged {
            let mut rows: Vec<String> = result
                .outlier_indices
                .iter()
                .take(10)
                .map(ToString::to_string)
                .collect();
            if result.outlier_indices.len() > 10 {
                rows.push("...".to_string());
            }
            println!(
                "  {} [{}]: {} outside [{}, {}] at rows {}",
                column,
                method,
                result.outlier_count,
                result.lower_bound,
                result.upper_bound,
                rows.join(", ")
            );
        }
    }
}

/// Print a one-row-per-column summary table, optionally persisting it.
pub(crate) fn cmd_summary(
    path: &PathBuf,
    factor: f64,
    zscore_threshold: f64,
    thresholds: Option<&Path>,
    methods: &str,
    output: Option<&PathBuf>,
) -> crate::Result<()> {
    let dataset = load_dataset(path)?;
    let methods = parse_methods(methods, factor, zscore_threshold)?;
    let detector = OutlierDetector::new()
        .with_thresholds(load_thresholds(thresholds)?)
        .with_methods(methods);

    let summary = detector.summary(&dataset)?;

    println!("Outlier summary for {}:", path.display());
    println!();
    print_batches(summary.batches()).map_err(crate::Error::Arrow)?;

    if let Some(output_path) = output {
        save_dataset(&summary, output_path)?;
        println!();
        println!("Summary written to: {}", output_path.display());
    }

    Ok(())
}

/// Replace out-of-range cells with nulls and write the cleaned table.
pub(crate) fn cmd_clean(
    path: &PathBuf,
    output: &PathBuf,
    method: &str,
    factor: f64,
    thresholds: Option<&Path>,
    compare: bool,
) -> crate::Result<()> {
    let dataset = load_dataset(path)?;
    let cleaner = OutlierCleaner::new().with_thresholds(load_thresholds(thresholds)?);

    let (cleaned, report) = match method {
        "domain" => cleaner.clean_domain(&dataset)?,
        "iqr" => cleaner.clean_iqr(&dataset, factor)?,
        other => {
            return Err(crate::Error::invalid_config(format!(
                "Unknown cleaning method '{}', expected domain or iqr",
                other
            )));
        }
    };

    save_dataset(&cleaned, output)?;

    println!(
        "Cleaned {} -> {} ({} rows)",
        path.display(),
        output.display(),
        cleaned.len()
    );
    println!(
        "Cells replaced: {} across {} columns",
        report.total_replaced,
        report.columns_affected()
    );

    if !report.replaced.is_empty() {
        println!();
        println!("{:<24} {:>8}", "COLUMN", "REPLACED");
        println!("{}", "-".repeat(33));
        for (column, count) in &report.replaced {
            println!("{:<24} {:>8}", column, count);
        }
    }

    if compare && !report.replaced.is_empty() {
        let columns: Vec<&str> = report.replaced.keys().map(String::as_str).collect();
        let shifts = mean_shift(&dataset, &cleaned, &columns)?;

        println!();
        println!(
            "{:<24} {:>12} {:>12} {:>12}",
            "COLUMN", "MEAN BEFORE", "MEAN AFTER", "CHANGE"
        );
        println!("{}", "-".repeat(63));
        for shift in &shifts {
            println!(
                "{:<24} {:>12} {:>12} {:>12}",
                shift.column,
                fmt_stat(shift.before),
                fmt_stat(shift.after),
                fmt_stat(shift.change()),
            );
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Arc;

    use arrow::{
        array::Float64Array,
        datatypes::{DataType, Field, Schema},
    };

    use crate::ArrowDataset;

    use super::*;

    fn write_temperatures(path: &PathBuf) {
        let schema = Arc::new(Schema::new(vec![Field::new(
            "temperature",
            DataType::Float64,
            true,
        )]));
        let batch = arrow::array::RecordBatch::try_new(
            schema,
            vec![Arc::new(Float64Array::from(vec![
                1650.0, 1680.0, 50.0, 1620.0, 1900.0,
            ]))],
        )
        .ok()
        .unwrap_or_else(|| panic!("Should create batch"));

        let dataset = ArrowDataset::from_batch(batch)
            .ok()
            .unwrap_or_else(|| panic!("Should create dataset"));
        dataset
            .to_parquet(path)
            .ok()
            .unwrap_or_else(|| panic!("Should write parquet"));
    }

    fn write_thresholds(path: &PathBuf) {
        let thresholds = DomainThresholds::empty().with_range("temperature", 1400.0, 1700.0);
        thresholds
            .to_json_file(path)
            .ok()
            .unwrap_or_else(|| panic!("Should write thresholds"));
    }

    #[test]
    fn test_parse_methods_all() {
        let methods = parse_methods("domain,iqr,zscore", 1.5, 3.0).unwrap();
        assert_eq!(methods.len(), 3);
        assert_eq!(methods[0], OutlierMethod::Domain);
        assert_eq!(methods[1], OutlierMethod::Iqr { factor: 1.5 });
        assert_eq!(methods[2], OutlierMethod::ZScore { threshold: 3.0 });
    }

    #[test]
    fn test_parse_methods_whitespace() {
        let methods = parse_methods(" domain , iqr ", 3.0, 3.0).unwrap();
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[1], OutlierMethod::Iqr { factor: 3.0 });
    }

    #[test]
    fn test_parse_methods_unknown() {
        let result = parse_methods("domain,median", 1.5, 3.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_methods_empty() {
        let result = parse_methods("", 1.5, 3.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_cmd_analyze_text() {
        let temp_dir = tempfile::tempdir()
            .ok()
            .unwrap_or_else(|| panic!("Should create temp dir"));
        let data = temp_dir.path().join("lf.parquet");
        let ranges = temp_dir.path().join("thresholds.json");
        write_temperatures(&data);
        write_thresholds(&ranges);

        let result = cmd_analyze(
            &data,
            1.5,
            3.0,
            Some(ranges.as_path()),
            "domain,iqr,zscore",
            "text",
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_cmd_analyze_json() {
        let temp_dir = tempfile::tempdir()
            .ok()
            .unwrap_or_else(|| panic!("Should create temp dir"));
        let data = temp_dir.path().join("lf.parquet");
        let ranges = temp_dir.path().join("thresholds.json");
        write_temperatures(&data);
        write_thresholds(&ranges);

        let result = cmd_analyze(&data, 1.5, 3.0, Some(ranges.as_path()), "domain", "json");
        assert!(result.is_ok());
    }

    #[test]
    fn test_cmd_analyze_bad_method() {
        let temp_dir = tempfile::tempdir()
            .ok()
            .unwrap_or_else(|| panic!("Should create temp dir"));
        let data = temp_dir.path().join("lf.parquet");
        write_temperatures(&data);

        let result = cmd_analyze(&data, 1.5, 3.0, None, "mahalanobis", "text");
        assert!(result.is_err());
    }

    #[test]
    fn test_cmd_summary_writes_csv() {
        let temp_dir = tempfile::tempdir()
            .ok()
            .unwrap_or_else(|| panic!("Should create temp dir"));
        let data = temp_dir.path().join("lf.parquet");
        let ranges = temp_dir.path().join("thresholds.json");
        let out = temp_dir.path().join("summary.csv");
        write_temperatures(&data);
        write_thresholds(&ranges);

        let result = cmd_summary(
            &data,
            1.5,
            3.0,
            Some(ranges.as_path()),
            "domain,iqr,zscore",
            Some(&out),
        );
        assert!(result.is_ok());
        assert!(out.exists());
    }

    #[test]
    fn test_cmd_clean_domain() {
        let temp_dir = tempfile::tempdir()
            .ok()
            .unwrap_or_else(|| panic!("Should create temp dir"));
        let data = temp_dir.path().join("lf.parquet");
        let ranges = temp_dir.path().join("thresholds.json");
        let out = temp_dir.path().join("clean.parquet");
        write_temperatures(&data);
        write_thresholds(&ranges);

        let result = cmd_clean(&data, &out, "domain", 1.5, Some(ranges.as_path()), true);
        assert!(result.is_ok());

        let cleaned = ArrowDataset::from_parquet(&out)
            .ok()
            .unwrap_or_else(|| panic!("Should load cleaned"));
        assert_eq!(cleaned.len(), 5);
        let batch = cleaned.to_single_batch().unwrap();
        assert_eq!(batch.column(0).null_count(), 2);
    }

    #[test]
    fn test_cmd_clean_iqr() {
        let temp_dir = tempfile::tempdir()
            .ok()
            .unwrap_or_else(|| panic!("Should create temp dir"));
        let data = temp_dir.path().join("lf.parquet");
        let out = temp_dir.path().join("clean.parquet");
        write_temperatures(&data);

        let result = cmd_clean(&data, &out, "iqr", 1.5, None, false);
        assert!(result.is_ok());
        assert!(out.exists());
    }

    #[test]
    fn test_cmd_clean_unknown_method() {
        let temp_dir = tempfile::tempdir()
            .ok()
            .unwrap_or_else(|| panic!("Should create temp dir"));
        let data = temp_dir.path().join("lf.parquet");
        let out = temp_dir.path().join("clean.parquet");
        write_temperatures(&data);

        let result = cmd_clean(&data, &out, "winsorize", 1.5, None, false);
        assert!(result.is_err());
    }
}
