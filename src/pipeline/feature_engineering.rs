//! Stage 2: derived features and training-row cleanup

use crate::error::{Result, SolarError};
use crate::preprocessing::{OutlierBounds, OutlierDetector};
use crate::utils::frame::{filter_rows, numeric_values, put_numeric, require_columns};
use polars::prelude::*;
use tracing::{debug, info};

pub const VOLTAGE: &str = "voltage";
pub const MODULE_TEMPERATURE: &str = "module_temperature";
pub const CORRECTED_VOLTAGE: &str = "corrected_voltage";
pub const POWER: &str = "power";

/// Reference cell temperature in degrees C
const REFERENCE_TEMPERATURE: f64 = 25.0;
/// Voltage correction per degree below the reference
const TEMPERATURE_COEFFICIENT: f64 = 0.3;
/// Training rows at or above this corrected voltage are implausible
const MAX_CORRECTED_VOLTAGE: f64 = 70.0;
const IQR_FACTOR: f64 = 1.5;

/// Add `corrected_voltage = max(0, voltage + 0.3 * (25 - module_temperature))`
pub fn add_corrected_voltage(df: &DataFrame) -> Result<DataFrame> {
    require_columns(df, &[VOLTAGE, MODULE_TEMPERATURE])?;
    let voltage = numeric_values(df, VOLTAGE)?;
    let temperature = numeric_values(df, MODULE_TEMPERATURE)?;

    let corrected = voltage
        .iter()
        .zip(&temperature)
        .map(|(v, t)| match (v, t) {
            (Some(v), Some(t)) => {
                Some((v + TEMPERATURE_COEFFICIENT * (REFERENCE_TEMPERATURE - t)).max(0.0))
            }
            _ => None,
        })
        .collect();

    let mut out = df.clone();
    put_numeric(&mut out, CORRECTED_VOLTAGE, corrected)?;
    Ok(out)
}

/// Keep training rows with nonzero efficiency and corrected voltage below 70.
///
/// A missing corrected voltage is not below 70, so those rows go too.
pub fn drop_implausible_rows(df: &DataFrame, target: &str) -> Result<DataFrame> {
    let efficiency = numeric_values(df, target)?;
    let corrected = numeric_values(df, CORRECTED_VOLTAGE)?;

    let keep: Vec<bool> = efficiency
        .iter()
        .zip(&corrected)
        .map(|(e, c)| *e != Some(0.0) && c.map_or(false, |c| c < MAX_CORRECTED_VOLTAGE))
        .collect();

    let filtered = filter_rows(df, &keep)?;
    debug!(
        rows_in = df.height(),
        rows_out = filtered.height(),
        "Dropped zero-efficiency and high-voltage rows"
    );
    Ok(filtered)
}

/// Derive corrected voltage on both tables, then filter the training rows only
pub fn derive_corrected_voltage(
    train: &DataFrame,
    test: &DataFrame,
    target: &str,
) -> Result<(DataFrame, DataFrame)> {
    let train = add_corrected_voltage(train)?;
    let test = add_corrected_voltage(test)?;
    let train = drop_implausible_rows(&train, target)?;
    Ok((train, test))
}

/// Set `power` to the square of `column`
pub fn add_power(df: &DataFrame, column: &str) -> Result<DataFrame> {
    let power = numeric_values(df, column)?
        .into_iter()
        .map(|v| v.map(|x| x * x))
        .collect();
    let mut out = df.clone();
    put_numeric(&mut out, POWER, power)?;
    Ok(out)
}

/// Square `column` into `power` on both tables, then clip the training power
/// to the IQR fences learned from the training table. Test power is left as is.
pub fn derive_power_and_clip(
    train: &DataFrame,
    test: &DataFrame,
    column: &str,
) -> Result<(DataFrame, DataFrame, OutlierBounds)> {
    let train = add_power(train, column)?;
    let test = add_power(test, column)?;

    let mut detector = OutlierDetector::iqr(IQR_FACTOR).with_columns(vec![POWER.to_string()]);
    let train = detector.fit_transform(&train)?;
    let bounds = detector
        .bounds(POWER)
        .copied()
        .ok_or_else(|| SolarError::ColumnNotFound(POWER.to_string()))?;

    info!(
        source = column,
        q1 = bounds.q1,
        q3 = bounds.q3,
        lower = bounds.lower,
        upper = bounds.upper,
        "Clipped training power"
    );
    Ok((train, test, bounds))
}
