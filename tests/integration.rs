//! Integration tests for refinar.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::uninlined_format_args
)]

use std::sync::Arc;

use arrow::{
    array::{Array, Float64Array, Int64Array, RecordBatch, StringArray},
    datatypes::{DataType, Field, Schema},
};
use refinar::{
    ArrowDataset, Chain, Dataset, DomainThresholds, GradeFilter, OutlierCleaner, OutlierDetector,
    OutlierMethod, Transform, VariablePivot, YearFilter, mean_shift, merge_casting_tables,
};

/// Ladle furnace export with two bogus inlet readings and a stale loss.
fn lf_dataset() -> ArrowDataset {
    let schema = Arc::new(Schema::new(vec![
        Field::new("heat", DataType::Utf8, false),
        Field::new("nhiet_do_vao_tl", DataType::Float64, true),
        Field::new("nhiet_do_ra_thep", DataType::Float64, true),
        Field::new("temp_loss", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec![
                "H0001", "H0002", "H0003", "H0004", "H0005",
            ])),
            Arc::new(Float64Array::from(vec![
                1650.0, 1680.0, 50.0, 1620.0, 1900.0,
            ])),
            Arc::new(Float64Array::from(vec![
                1600.0, 1640.0, 1580.0, 1585.0, 1610.0,
            ])),
            Arc::new(Float64Array::from(vec![999.0, 40.0, 30.0, 35.0, 20.0])),
        ],
    )
    .ok()
    .unwrap_or_else(|| panic!("Should create batch"));

    ArrowDataset::from_batch(batch)
        .ok()
        .unwrap_or_else(|| panic!("Should create dataset"))
}

fn f64_column(dataset: &ArrowDataset, name: &str) -> Float64Array {
    let batch = dataset.to_single_batch().unwrap();
    let idx = batch.schema().index_of(name).unwrap();
    batch
        .column(idx)
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap_or_else(|| panic!("Should be Float64Array"))
        .clone()
}

#[test]
fn test_analyze_against_engineering_limits() {
    let dataset = lf_dataset();
    let report = OutlierDetector::new().analyze(&dataset).unwrap();

    // 50 and 1900 fall outside the 1400..=1700 inlet range
    let inlet = report.get("nhiet_do_vao_tl").unwrap();
    let domain = inlet.domain.as_ref().unwrap();
    assert_eq!(domain.outlier_indices, vec![2, 4]);
    assert_eq!(domain.lower_bound, 1400.0);
    assert_eq!(domain.upper_bound, 1700.0);

    // All outlet readings are in range
    let outlet = report.get("nhiet_do_ra_thep").unwrap();
    assert_eq!(outlet.domain.as_ref().unwrap().outlier_count, 0);

    // The stale 999 loss exceeds the -100..=100 loss range
    let loss = report.get("temp_loss").unwrap();
    assert_eq!(loss.domain.as_ref().unwrap().outlier_indices, vec![0]);

    // The string column is not analyzed
    assert!(report.get("heat").is_none());
}

#[test]
fn test_clean_domain_end_to_end() {
    let dataset = lf_dataset();
    let (cleaned, report) = OutlierCleaner::new().clean_domain(&dataset).unwrap();

    // Rows are never dropped
    assert_eq!(cleaned.len(), 5);
    assert_eq!(cleaned.schema().fields().len(), 4);

    // Out-of-range inlet readings become nulls
    let inlet = f64_column(&cleaned, "nhiet_do_vao_tl");
    assert!(inlet.is_null(2));
    assert!(inlet.is_null(4));
    assert_eq!(inlet.value(0), 1650.0);

    // The loss column is recomputed from the cleaned temperatures
    let loss = f64_column(&cleaned, "temp_loss");
    assert_eq!(loss.value(0), 50.0);
    assert_eq!(loss.value(1), 40.0);
    assert!(loss.is_null(2));
    assert_eq!(loss.value(3), 35.0);
    assert!(loss.is_null(4));

    assert_eq!(report.replaced.get("nhiet_do_vao_tl"), Some(&2));
    assert_eq!(report.replaced.get("temp_loss"), Some(&1));
    assert_eq!(report.total_replaced, 3);
}

#[test]
fn test_cleaning_is_idempotent() {
    let dataset = lf_dataset();
    let cleaner = OutlierCleaner::new();

    let (cleaned, first) = cleaner.clean_domain(&dataset).unwrap();
    let (again, second) = cleaner.clean_domain(&cleaned).unwrap();

    assert!(first.total_replaced > 0);
    assert_eq!(second.total_replaced, 0);
    assert_eq!(again.len(), cleaned.len());
}

#[test]
fn test_mean_shift_after_cleaning() {
    let dataset = lf_dataset();
    let (cleaned, _) = OutlierCleaner::new().clean_domain(&dataset).unwrap();

    let shifts = mean_shift(&dataset, &cleaned, &["nhiet_do_vao_tl"]).unwrap();
    assert_eq!(shifts.len(), 1);
    // (1650 + 1680 + 50 + 1620 + 1900) / 5 = 1380 before,
    // (1650 + 1680 + 1620) / 3 = 1650 after
    assert_eq!(shifts[0].before, Some(1380.0));
    assert_eq!(shifts[0].after, Some(1650.0));
    assert_eq!(shifts[0].change(), Some(270.0));
}

#[test]
fn test_cleaned_parquet_roundtrip() {
    let temp_dir = tempfile::tempdir()
        .ok()
        .unwrap_or_else(|| panic!("Should create temp dir"));
    let path = temp_dir.path().join("lf_clean.parquet");

    let dataset = lf_dataset();
    let (cleaned, _) = OutlierCleaner::new().clean_domain(&dataset).unwrap();
    cleaned.to_parquet(&path).unwrap();

    let loaded = ArrowDataset::from_parquet(&path).unwrap();
    assert_eq!(loaded.len(), cleaned.len());

    let inlet = f64_column(&loaded, "nhiet_do_vao_tl");
    assert_eq!(inlet.null_count(), 2);
}

#[test]
fn test_summary_persisted_as_csv() {
    let temp_dir = tempfile::tempdir()
        .ok()
        .unwrap_or_else(|| panic!("Should create temp dir"));
    let path = temp_dir.path().join("summary.csv");

    let dataset = lf_dataset();
    let summary = OutlierDetector::new().summary(&dataset).unwrap();
    summary.to_csv(&path).unwrap();

    let loaded = ArrowDataset::from_csv(&path).unwrap();
    // One summary row per numeric column
    assert_eq!(loaded.len(), 3);
}

#[test]
fn test_custom_thresholds_from_json() {
    let temp_dir = tempfile::tempdir()
        .ok()
        .unwrap_or_else(|| panic!("Should create temp dir"));
    let path = temp_dir.path().join("thresholds.json");

    let custom = DomainThresholds::empty().with_range("nhiet_do_vao_tl", 1640.0, 1700.0);
    custom.to_json_file(&path).unwrap();

    let loaded = DomainThresholds::from_json_file(&path).unwrap();
    let detector = OutlierDetector::new()
        .with_thresholds(loaded)
        .with_methods(vec![OutlierMethod::Domain]);

    let report = detector.analyze(&lf_dataset()).unwrap();
    // The tighter floor also flags the 1620 reading
    let inlet = report.get("nhiet_do_vao_tl").unwrap();
    assert_eq!(
        inlet.domain.as_ref().unwrap().outlier_indices,
        vec![2, 3, 4]
    );
    // Columns without an entry in the custom table get no domain result
    let outlet = report.get("nhiet_do_ra_thep").unwrap();
    assert!(outlet.domain.is_none());
}

#[test]
fn test_csv_with_missing_cells() {
    let csv = "heat,nhiet_do_vao_tl\nH0001,1650.0\nH0002,\nH0003,1900.0\n";
    let dataset = ArrowDataset::from_csv_str(csv).unwrap();

    let report = OutlierDetector::new().analyze(&dataset).unwrap();
    let inlet = report.get("nhiet_do_vao_tl").unwrap();
    assert_eq!(inlet.total_count, 3);
    assert_eq!(inlet.non_missing, 2);
    assert_eq!(inlet.missing, 1);
    // The missing cell is never flagged
    assert_eq!(inlet.domain.as_ref().unwrap().outlier_indices, vec![2]);
}

#[test]
fn test_merge_then_screen_workflow() {
    // Long-format process variables for two heats
    let vars = ArrowDataset::from_batch(
        RecordBatch::try_new(
            Arc::new(Schema::new(vec![
                Field::new("REPORT_COUNTER", DataType::Int64, false),
                Field::new("PROD_COUNTER", DataType::Int64, false),
                Field::new("VARIABLE_ID", DataType::Int64, false),
                Field::new("VALUE_CODE", DataType::Int64, false),
                Field::new("AVG_VALUE", DataType::Float64, true),
            ])),
            vec![
                Arc::new(Int64Array::from(vec![101, 101, 102, 102])),
                Arc::new(Int64Array::from(vec![1, 1, 1, 1])),
                Arc::new(Int64Array::from(vec![13, 45, 13, 45])),
                Arc::new(Int64Array::from(vec![1, 1, 1, 1])),
                Arc::new(Float64Array::from(vec![1.42, 1520.0, 1.38, 9999.0])),
            ],
        )
        .unwrap(),
    )
    .unwrap();

    let products = ArrowDataset::from_batch(
        RecordBatch::try_new(
            Arc::new(Schema::new(vec![
                Field::new("REPORT_COUNTER", DataType::Int64, false),
                Field::new("PROD_COUNTER", DataType::Int64, false),
                Field::new("STEEL_GRADE_NAME", DataType::Utf8, true),
            ])),
            vec![
                Arc::new(Int64Array::from(vec![101, 102])),
                Arc::new(Int64Array::from(vec![1, 1])),
                Arc::new(StringArray::from(vec!["SAE1006", "SAE1008"])),
            ],
        )
        .unwrap(),
    )
    .unwrap();

    let heats = ArrowDataset::from_batch(
        RecordBatch::try_new(
            Arc::new(Schema::new(vec![
                Field::new("REPORT_COUNTER", DataType::Int64, false),
                Field::new("tieu_thu_dien", DataType::Float64, true),
            ])),
            vec![
                Arc::new(Int64Array::from(vec![101, 102])),
                Arc::new(Float64Array::from(vec![5000.0, 5200.0])),
            ],
        )
        .unwrap(),
    )
    .unwrap();

    let merged = merge_casting_tables(
        &vars,
        &products,
        &heats,
        &VariablePivot::casting_defaults(),
    )
    .unwrap();
    assert_eq!(merged.len(), 2);

    // Screen the merged table against a pivot-column threshold
    let detector = OutlierDetector::new()
        .with_thresholds(DomainThresholds::empty().with_range("temperature", 1400.0, 1700.0))
        .with_methods(vec![OutlierMethod::Domain]);
    let report = detector.analyze(&merged).unwrap();

    let temperature = report.get("temperature").unwrap();
    assert_eq!(temperature.domain.as_ref().unwrap().outlier_indices, vec![1]);
}

#[test]
fn test_grade_and_year_filter_workflow() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("STEEL_GRADE_NAME", DataType::Utf8, true),
        Field::new("START_DATE", DataType::Utf8, true),
        Field::new("speed", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec![
                "SAE1006", "A36", "sae1012", "SAE1008",
            ])),
            Arc::new(StringArray::from(vec![
                "2025-02-01T08:00:00",
                "2025-03-01T08:00:00",
                "2024-12-31T23:00:00",
                "2025-05-10T12:00:00",
            ])),
            Arc::new(Float64Array::from(vec![1.42, 1.38, 1.45, 1.41])),
        ],
    )
    .unwrap();

    let filtered = Chain::new()
        .then(GradeFilter::contains("sae"))
        .then(YearFilter::new("START_DATE", 2025))
        .apply(batch)
        .unwrap();

    // sae matches rows 0, 2, 3; the 2024 heat drops
    assert_eq!(filtered.num_rows(), 2);
}
