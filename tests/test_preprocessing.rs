//! Integration test: data preparation stages and model preprocessing

mod common;

use common::{f64_column, synthetic_raw};
use polars::prelude::*;
use solar_efficiency::pipeline::{feature_engineering, ingestion, missing_values, model_training};
use solar_efficiency::preprocessing::ColumnPreprocessor;
use solar_efficiency::utils::frame::missing_count;
use solar_efficiency::SolarError;

fn ingested(n: usize, offset: usize, with_target: bool) -> DataFrame {
    let raw = synthetic_raw(n, offset, with_target);
    let df = ingestion::positive_irradiance_rows(&raw).unwrap();
    ingestion::coerce_columns(&df, &["humidity", "wind_speed", "pressure"]).unwrap()
}

#[test]
fn test_ingested_irradiance_is_positive() {
    let raw = synthetic_raw(80, 0, true);
    let df = ingested(80, 0, true);

    let dropped = f64_column(&raw, "irradiance").iter().filter(|v| v.unwrap() <= 0.0).count();
    assert!(dropped > 0);
    assert_eq!(df.height(), raw.height() - dropped);
    assert!(f64_column(&df, "irradiance").iter().all(|v| v.unwrap() > 0.0));
}

#[test]
fn test_coercion_turns_unparsable_text_into_missing() {
    let raw = synthetic_raw(40, 0, true);
    let df = ingested(40, 0, true);
    assert_eq!(df.column("humidity").unwrap().dtype(), &DataType::Float64);

    // Kept rows whose humidity is absent or does not parse
    let humidity = raw.column("humidity").unwrap().str().unwrap().clone();
    let expected = humidity
        .into_iter()
        .zip(f64_column(&raw, "irradiance"))
        .filter(|(h, irr)| irr.unwrap() > 0.0 && h.map_or(true, |s| s.parse::<f64>().is_err()))
        .count();
    assert!(expected > 0);
    assert_eq!(missing_count(&df, "humidity").unwrap(), expected);
}

#[test]
fn test_corrected_voltage_is_never_negative() {
    let df = df!(
        "voltage" => &[Some(0.5), Some(30.0), None, Some(2.0)],
        "module_temperature" => &[Some(60.0), Some(25.0), Some(30.0), Some(10.0)],
    )
    .unwrap();

    let out = feature_engineering::add_corrected_voltage(&df).unwrap();
    let corrected = f64_column(&out, "corrected_voltage");
    assert_eq!(corrected[0], Some(0.0));
    assert_eq!(corrected[1], Some(30.0));
    assert_eq!(corrected[2], None);
    assert!((corrected[3].unwrap() - 6.5).abs() < 1e-12);
}

#[test]
fn test_training_rows_are_filtered_but_test_rows_are_not() {
    let train = ingested(60, 0, true);
    let test = ingested(30, 200, false);

    let (train_out, test_out) =
        feature_engineering::derive_corrected_voltage(&train, &test, "efficiency").unwrap();

    assert!(train_out.height() < train.height());
    assert_eq!(test_out.height(), test.height());
    assert!(f64_column(&train_out, "efficiency").iter().all(|e| *e != Some(0.0)));
    assert!(f64_column(&train_out, "corrected_voltage")
        .iter()
        .all(|v| v.map_or(false, |v| v >= 0.0 && v < 70.0)));
    // Test rows with no voltage keep a missing corrected voltage
    assert_eq!(
        missing_count(&test_out, "corrected_voltage").unwrap(),
        missing_count(&test, "voltage").unwrap()
    );
}

#[test]
fn test_power_is_clipped_on_train_only() {
    let train = df!("current" => &[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
    let test = df!("current" => &[1.0, 100.0]).unwrap();

    let (train_out, test_out, bounds) =
        feature_engineering::derive_power_and_clip(&train, &test, "current").unwrap();

    // power = [1, 4, 9, 16, 10000], Q1 = 4, Q3 = 16
    assert_eq!(bounds.q1, 4.0);
    assert_eq!(bounds.q3, 16.0);
    assert_eq!(bounds.upper, 34.0);
    assert!(f64_column(&train_out, "power")
        .iter()
        .all(|p| p.map_or(false, |p| p >= bounds.lower && p <= bounds.upper)));
    assert_eq!(f64_column(&test_out, "power"), vec![Some(1.0), Some(10000.0)]);
}

#[test]
fn test_mode_fill_leaves_no_missing_categoricals() {
    let train = ingested(45, 0, true);
    let test = ingested(15, 300, false);

    let (train, test) =
        missing_values::fill_categorical_mode(&train, &test, &["error_code", "installation_type"])
            .unwrap();
    for df in [&train, &test] {
        assert_eq!(missing_count(df, "error_code").unwrap(), 0);
        assert_eq!(missing_count(df, "installation_type").unwrap(), 0);
    }
}

#[test]
fn test_mode_fill_of_empty_column_fails() {
    let df = df!(
        "error_code" => &[None::<&str>, None, None],
    )
    .unwrap();
    let result = missing_values::fill_mode(&df, "error_code");
    assert!(matches!(result, Err(SolarError::DataError(_))));
}

#[test]
fn test_unreliable_column_must_exist() {
    let df = df!("a" => &[1.0]).unwrap();
    let result = missing_values::drop_unreliable_column(&df, &df, "temperature");
    assert!(matches!(result, Err(SolarError::ColumnNotFound(_))));
}

#[test]
fn test_sentinels_become_missing() {
    let df = df!(
        "error_code" => &[Some("E00"), Some("unknown"), Some("error"), None],
        "humidity" => &[1.0, 2.0, 3.0, 4.0],
    )
    .unwrap();

    let out = model_training::sanitize_table(&df, &["unknown", "badval", "error"]).unwrap();
    assert_eq!(missing_count(&out, "error_code").unwrap(), 3);
    assert_eq!(missing_count(&out, "humidity").unwrap(), 0);
}

#[test]
fn test_preprocessor_handles_unseen_categories() {
    let train = df!(
        "id" => &[1i64, 2, 3, 4],
        "irradiance" => &[Some(100.0), None, Some(300.0), Some(500.0)],
        "string_id" => &[Some("A"), Some("B"), Some("A"), None],
    )
    .unwrap();
    let test = df!(
        "id" => &[9i64, 10],
        "irradiance" => &[None, Some(200.0)],
        "string_id" => &[Some("Z"), Some("B")],
    )
    .unwrap();

    let mut preprocessor = ColumnPreprocessor::new();
    let fitted = preprocessor.fit_transform(&train, &["string_id"], &["id"]).unwrap();
    assert_eq!(
        preprocessor.feature_names(),
        vec!["irradiance", "string_id_A", "string_id_B"]
    );
    assert_eq!(fitted.dim(), (4, 3));
    // Mean of 100, 300, 500
    assert_eq!(fitted[[1, 0]], 300.0);
    // Missing category takes the most frequent one
    assert_eq!(fitted.row(3).to_vec(), vec![500.0, 1.0, 0.0]);

    let out = preprocessor.transform(&test).unwrap();
    assert_eq!(out.row(0).to_vec(), vec![300.0, 0.0, 0.0]);
    assert_eq!(out.row(1).to_vec(), vec![200.0, 0.0, 1.0]);
}
