//! Stage 3: missing-value handling
//!
//! Every statistic here is fitted on the table it is applied to; train and
//! test never see each other's values.

use crate::error::{Result, SolarError};
use crate::imputation::{Imputer, KNNImputer};
use crate::utils::frame::{
    missing_count, numeric_matrix, numeric_values, put_matrix, put_numeric, put_text,
    require_columns, text_values,
};
use polars::prelude::*;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::{debug, warn};

/// Remove `column` from both tables
pub fn drop_unreliable_column(
    train: &DataFrame,
    test: &DataFrame,
    column: &str,
) -> Result<(DataFrame, DataFrame)> {
    require_columns(train, &[column])?;
    require_columns(test, &[column])?;
    Ok((train.drop(column)?, test.drop(column)?))
}

/// KNN-impute a block of numeric columns of one table, fitted on that table.
///
/// `settings` supplies the neighbor count and weighting; a fresh copy is
/// fitted for every call.
pub fn knn_impute_columns(df: &DataFrame, columns: &[&str], settings: &KNNImputer) -> Result<DataFrame> {
    let matrix = numeric_matrix(df, columns)?;
    if matrix.nrows() == 0 {
        return Ok(df.clone());
    }

    let mut imputer = settings.clone();
    let imputed = imputer.fit_transform(&matrix)?;

    for j in imputer.empty_features() {
        warn!(column = columns[j], "Column has no observed values, left missing");
    }

    let mut out = df.clone();
    put_matrix(&mut out, columns, &imputed)?;
    Ok(out)
}

/// Impute one column per table with a k-nearest-neighbor imputer
pub fn impute_single_column(
    train: &DataFrame,
    test: &DataFrame,
    column: &str,
    settings: &KNNImputer,
) -> Result<(DataFrame, DataFrame)> {
    let train = knn_impute_columns(train, &[column], settings)?;
    let test = knn_impute_columns(test, &[column], settings)?;
    debug!(column, "Single-column imputation done");
    Ok((train, test))
}

/// Jointly impute a fixed list of numeric columns, fitted independently per table
pub fn impute_feature_block(
    train: &DataFrame,
    test: &DataFrame,
    columns: &[&str],
    settings: &KNNImputer,
) -> Result<(DataFrame, DataFrame)> {
    let train = knn_impute_columns(train, columns, settings)?;
    let test = knn_impute_columns(test, columns, settings)?;
    debug!(n_columns = columns.len(), "Feature block imputation done");
    Ok((train, test))
}

/// Most frequent value; on equal counts the value seen first wins
fn first_mode<T: Eq + Hash + Clone>(values: impl IntoIterator<Item = T>) -> Option<T> {
    let mut counts: HashMap<T, (usize, usize)> = HashMap::new();
    for (pos, value) in values.into_iter().enumerate() {
        counts.entry(value).or_insert((0, pos)).0 += 1;
    }
    counts
        .into_iter()
        .max_by(|(_, (ca, fa)), (_, (cb, fb))| ca.cmp(cb).then(fb.cmp(fa)))
        .map(|(value, _)| value)
}

/// Fill missing entries of one column with its own mode
pub fn fill_mode(df: &DataFrame, column: &str) -> Result<DataFrame> {
    require_columns(df, &[column])?;
    let mut out = df.clone();
    let entirely_missing =
        || SolarError::DataError(format!("Column {} is entirely missing, mode is undefined", column));

    if df.column(column)?.dtype().is_primitive_numeric() {
        let values = numeric_values(df, column)?;
        let mode = first_mode(values.iter().flatten().map(|v| v.to_bits()))
            .map(f64::from_bits)
            .ok_or_else(entirely_missing)?;
        put_numeric(&mut out, column, values.into_iter().map(|v| Some(v.unwrap_or(mode))).collect())?;
    } else {
        let values = text_values(df, column)?;
        let mode = first_mode(values.iter().flatten().cloned()).ok_or_else(entirely_missing)?;
        put_text(
            &mut out,
            column,
            values
                .into_iter()
                .map(|v| Some(v.unwrap_or_else(|| mode.clone())))
                .collect(),
        )?;
    }
    Ok(out)
}

/// Fill the named categorical columns with each table's own mode
pub fn fill_categorical_mode(
    train: &DataFrame,
    test: &DataFrame,
    columns: &[&str],
) -> Result<(DataFrame, DataFrame)> {
    let mut train = train.clone();
    let mut test = test.clone();
    for column in columns {
        train = fill_mode(&train, column)?;
        test = fill_mode(&test, column)?;
    }
    Ok((train, test))
}

/// Missing counts per column, for stage logging
pub fn missing_summary(df: &DataFrame) -> Result<Vec<(String, usize)>> {
    df.get_column_names()
        .into_iter()
        .map(|name| Ok((name.to_string(), missing_count(df, name.as_str())?)))
        .collect()
}
