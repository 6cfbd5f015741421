//! Shared fixtures for integration tests

#![allow(dead_code)]

use polars::prelude::*;

const STRING_IDS: [&str; 4] = ["A-101", "B-202", "C-303", "D-404"];
const ERROR_CODES: [&str; 3] = ["E00", "E01", "E02"];
const INSTALLATIONS: [&str; 3] = ["dual-axis", "fixed", "tracking"];

/// Deterministic raw sensor table shaped like the competition data.
///
/// Contains non-positive irradiance, unparsable humidity, sentinel strings,
/// missing numeric and categorical entries and, with a target, a few
/// zero-efficiency rows. `offset` shifts the generated values.
pub fn synthetic_raw(n: usize, offset: usize, with_target: bool) -> DataFrame {
    let mut id = Vec::with_capacity(n);
    let mut temperature = Vec::with_capacity(n);
    let mut irradiance = Vec::with_capacity(n);
    let mut humidity: Vec<Option<String>> = Vec::with_capacity(n);
    let mut panel_age = Vec::with_capacity(n);
    let mut maintenance_count = Vec::with_capacity(n);
    let mut soiling_ratio = Vec::with_capacity(n);
    let mut voltage = Vec::with_capacity(n);
    let mut current = Vec::with_capacity(n);
    let mut module_temperature = Vec::with_capacity(n);
    let mut cloud_coverage = Vec::with_capacity(n);
    let mut wind_speed = Vec::with_capacity(n);
    let mut pressure = Vec::with_capacity(n);
    let mut string_id = Vec::with_capacity(n);
    let mut error_code: Vec<Option<&str>> = Vec::with_capacity(n);
    let mut installation_type: Vec<Option<&str>> = Vec::with_capacity(n);
    let mut efficiency = Vec::with_capacity(n);

    for i in 0..n {
        let t = (i + offset) as f64;
        let irr = if i % 11 == 4 { -5.0 } else { 200.0 + (t * 37.0) % 800.0 };
        let age = (t * 1.3) % 30.0;
        let soil = 0.6 + (t * 0.037) % 0.4;

        id.push((i + offset) as i64);
        temperature.push(if i % 9 == 8 { None } else { Some(15.0 + (t * 3.0) % 20.0) });
        irradiance.push(irr);
        humidity.push(match i % 8 {
            2 => Some("badval".to_string()),
            5 => None,
            _ => Some(format!("{:.1}", 30.0 + (t * 7.0) % 50.0)),
        });
        panel_age.push(age);
        maintenance_count.push(((i + offset) * 3 % 10) as f64);
        soiling_ratio.push(if i % 10 == 7 { None } else { Some(soil) });
        voltage.push(if i % 12 == 3 { None } else { Some(15.0 + (t * 2.9) % 30.0) });
        current.push(if i % 13 == 6 { None } else { Some(0.5 + (t * 0.21) % 3.0) });
        module_temperature.push(20.0 + (t * 1.7) % 30.0);
        cloud_coverage.push((t * 9.1) % 100.0);
        wind_speed.push((t * 0.77) % 15.0);
        pressure.push(1000.0 + (t * 1.9) % 30.0);
        string_id.push(STRING_IDS[i % 4]);
        error_code.push(match i {
            _ if i % 6 == 1 => None,
            _ if i % 9 == 0 => Some("unknown"),
            _ => Some(ERROR_CODES[i % 3]),
        });
        installation_type.push(if i % 7 == 2 { None } else { Some(INSTALLATIONS[i % 3]) });
        efficiency.push(if i % 17 == 5 {
            0.0
        } else {
            0.2 + 0.0003 * irr.max(0.0) - 0.002 * age - 0.05 * (1.0 - soil)
        });
    }

    let mut df = df!(
        "id" => &id,
        "temperature" => &temperature,
        "irradiance" => &irradiance,
        "humidity" => &humidity,
        "panel_age" => &panel_age,
        "maintenance_count" => &maintenance_count,
        "soiling_ratio" => &soiling_ratio,
        "voltage" => &voltage,
        "current" => &current,
        "module_temperature" => &module_temperature,
        "cloud_coverage" => &cloud_coverage,
        "wind_speed" => &wind_speed,
        "pressure" => &pressure,
        "string_id" => &string_id,
        "error_code" => &error_code,
        "installation_type" => &installation_type,
    )
    .unwrap();

    if with_target {
        df.with_column(Series::new("efficiency".into(), efficiency)).unwrap();
    }
    df
}

pub fn f64_column(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

pub fn i64_column(df: &DataFrame, name: &str) -> Vec<Option<i64>> {
    df.column(name).unwrap().i64().unwrap().into_iter().collect()
}
