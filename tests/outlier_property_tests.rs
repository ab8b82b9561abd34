//! Property-based tests for outlier detection and cleaning.
//!
//! Uses proptest to verify the screening invariants hold across random
//! columns, including columns with nulls and NaN readings.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use arrow::{
    array::{Array, Float64Array, RecordBatch},
    datatypes::{DataType, Field, Schema},
};
use proptest::prelude::*;
use refinar::{ArrowDataset, Dataset, OutlierCleaner, OutlierDetector, OutlierMethod};

/// Random column values mixing real readings, nulls, and NaN.
fn values_with_gaps() -> impl Strategy<Value = Vec<Option<f64>>> {
    prop::collection::vec(
        prop_oneof![
            6 => (-2000.0..2000.0f64).prop_map(Some),
            1 => Just(None),
            1 => Just(Some(f64::NAN)),
        ],
        0..40,
    )
}

/// Wraps the values in a single-column dataset named like the inlet
/// temperature, which the built-in table bounds at 1400..=1700.
fn dataset_from(values: Vec<Option<f64>>) -> ArrowDataset {
    let schema = Arc::new(Schema::new(vec![Field::new(
        "nhiet_do_vao_tl",
        DataType::Float64,
        true,
    )]));
    let batch =
        RecordBatch::try_new(schema, vec![Arc::new(Float64Array::from(values))]).unwrap();
    ArrowDataset::from_batch(batch).unwrap()
}

proptest! {
    /// Property: flagged rows hold real values strictly outside the range.
    #[test]
    fn prop_domain_flags_only_real_out_of_range_values(values in values_with_gaps()) {
        let dataset = dataset_from(values.clone());
        let report = OutlierDetector::new()
            .with_methods(vec![OutlierMethod::Domain])
            .analyze(&dataset)
            .unwrap();

        let analysis = report.get("nhiet_do_vao_tl").unwrap();
        let domain = analysis.domain.as_ref().unwrap();

        for &idx in &domain.outlier_indices {
            prop_assert!(idx < values.len());
            let value = values[idx];
            prop_assert!(value.is_some());
            let value = value.unwrap();
            prop_assert!(!value.is_nan());
            prop_assert!(value < 1400.0 || value > 1700.0);
        }
    }

    /// Property: a second domain pass finds nothing left to replace.
    #[test]
    fn prop_domain_cleaning_is_idempotent(values in values_with_gaps()) {
        let dataset = dataset_from(values);
        let cleaner = OutlierCleaner::new();

        let (cleaned, _) = cleaner.clean_domain(&dataset).unwrap();
        let (_, second) = cleaner.clean_domain(&cleaned).unwrap();

        prop_assert_eq!(second.total_replaced, 0);
    }

    /// Property: cleaning never changes the table shape.
    #[test]
    fn prop_cleaning_preserves_shape(values in values_with_gaps()) {
        let dataset = dataset_from(values);
        let (cleaned, _) = OutlierCleaner::new().clean_domain(&dataset).unwrap();

        prop_assert_eq!(cleaned.len(), dataset.len());
        prop_assert_eq!(
            cleaned.schema().fields().len(),
            dataset.schema().fields().len()
        );
    }

    /// Property: every surviving value sits inside the range.
    #[test]
    fn prop_cleaned_values_are_in_range(values in values_with_gaps()) {
        let dataset = dataset_from(values);
        let (cleaned, _) = OutlierCleaner::new().clean_domain(&dataset).unwrap();

        let batch = cleaned.to_single_batch().unwrap();
        let column = batch
            .column(0)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();

        for i in 0..column.len() {
            if column.is_valid(i) && !column.value(i).is_nan() {
                prop_assert!((1400.0..=1700.0).contains(&column.value(i)));
            }
        }
    }

    /// Property: widening the IQR fences never flags more values.
    #[test]
    fn prop_wider_iqr_fences_flag_no_more(
        values in values_with_gaps(),
        lo in 0.5..2.0f64,
        delta in 0.0..2.0f64,
    ) {
        let dataset = dataset_from(values);
        let count_at = |factor: f64| {
            let report = OutlierDetector::new()
                .with_methods(vec![OutlierMethod::Iqr { factor }])
                .analyze(&dataset)
                .unwrap();
            report
                .get("nhiet_do_vao_tl")
                .unwrap()
                .iqr
                .as_ref()
                .map_or(0, |r| r.outlier_count)
        };

        prop_assert!(count_at(lo + delta) <= count_at(lo));
    }

    /// Property: the z-score method stays silent on tiny samples.
    #[test]
    fn prop_zscore_needs_more_than_three_values(
        values in prop::collection::vec((-100.0..100.0f64).prop_map(Some), 0..4),
    ) {
        let dataset = dataset_from(values);
        let report = OutlierDetector::new()
            .with_methods(vec![OutlierMethod::zscore()])
            .analyze(&dataset)
            .unwrap();

        prop_assert!(report.get("nhiet_do_vao_tl").unwrap().zscore.is_none());
    }

    /// Property: any reported interval is ordered.
    #[test]
    fn prop_reported_bounds_are_ordered(values in values_with_gaps()) {
        let dataset = dataset_from(values);
        let report = OutlierDetector::new().analyze(&dataset).unwrap();
        let analysis = report.get("nhiet_do_vao_tl").unwrap();

        for result in [&analysis.domain, &analysis.iqr, &analysis.zscore]
            .into_iter()
            .flatten()
        {
            prop_assert!(result.lower_bound <= result.upper_bound);
        }
    }
}
