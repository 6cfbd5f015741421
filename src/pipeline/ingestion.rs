//! Stage 1: row filtering and numeric coercion of the raw tables

use crate::error::Result;
use crate::utils::frame::{filter_rows, numeric_values, put_numeric, require_columns};
use polars::prelude::*;
use tracing::debug;

pub const IRRADIANCE: &str = "irradiance";

/// Keep the rows whose irradiance is strictly positive.
///
/// Missing or unparsable irradiance never compares as positive, so those rows
/// are dropped as well.
pub fn positive_irradiance_rows(df: &DataFrame) -> Result<DataFrame> {
    let keep: Vec<bool> = numeric_values(df, IRRADIANCE)?
        .into_iter()
        .map(|v| v.map_or(false, |x| x > 0.0))
        .collect();
    let filtered = filter_rows(df, &keep)?;
    debug!(
        rows_in = df.height(),
        rows_out = filtered.height(),
        "Filtered non-positive irradiance"
    );
    Ok(filtered)
}

/// Drop rows with irradiance <= 0 from both tables, independently
pub fn filter_positive_irradiance(
    train: &DataFrame,
    test: &DataFrame,
) -> Result<(DataFrame, DataFrame)> {
    Ok((positive_irradiance_rows(train)?, positive_irradiance_rows(test)?))
}

/// Convert the named columns to floats; values that do not parse become null
pub fn coerce_columns(df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
    require_columns(df, columns)?;
    let mut out = df.clone();
    for col in columns {
        let values = numeric_values(df, col)?;
        put_numeric(&mut out, col, values)?;
    }
    Ok(out)
}

/// Numeric coercion applied to both tables
pub fn coerce_numeric(
    train: &DataFrame,
    test: &DataFrame,
    columns: &[&str],
) -> Result<(DataFrame, DataFrame)> {
    Ok((coerce_columns(train, columns)?, coerce_columns(test, columns)?))
}
