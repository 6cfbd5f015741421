//! Column helpers shared by the pipeline stages

use crate::error::{Result, SolarError};
use ndarray::Array2;
use polars::prelude::*;

/// Fail with `ColumnNotFound` for the first absent column
pub fn require_columns(df: &DataFrame, columns: &[&str]) -> Result<()> {
    let names = df.get_column_names();
    for col in columns {
        if !names.iter().any(|n| n.as_str() == *col) {
            return Err(SolarError::ColumnNotFound(col.to_string()));
        }
    }
    Ok(())
}

/// True when the frame has a column with this name
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|n| n.as_str() == name)
}

/// Read a column as floats.
///
/// The cast is non-strict: text that does not parse becomes `None`, and so
/// does `NaN`.
pub fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    require_columns(df, &[name])?;
    let casted = df.column(name)?.cast(&DataType::Float64)?;
    let values = casted
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(values)
}

/// Read a column as text, rendering non-string dtypes with their display form
pub fn text_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    require_columns(df, &[name])?;
    let casted = df.column(name)?.cast(&DataType::String)?;
    let values = casted
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}

/// Insert or replace a float column, keeping its position when it exists
pub fn put_numeric(df: &mut DataFrame, name: &str, values: Vec<Option<f64>>) -> Result<()> {
    let series = Series::new(name.into(), values);
    df.with_column(series)?;
    Ok(())
}

/// Insert or replace a text column, keeping its position when it exists
pub fn put_text(df: &mut DataFrame, name: &str, values: Vec<Option<String>>) -> Result<()> {
    let series = Series::new(name.into(), values);
    df.with_column(series)?;
    Ok(())
}

/// Keep the rows where `keep` is true
pub fn filter_rows(df: &DataFrame, keep: &[bool]) -> Result<DataFrame> {
    if keep.len() != df.height() {
        return Err(SolarError::ShapeError {
            expected: format!("mask length = {}", df.height()),
            actual: format!("mask length = {}", keep.len()),
        });
    }
    let mask = BooleanChunked::from_slice("mask".into(), keep);
    Ok(df.filter(&mask)?)
}

/// Gather float columns into a row-major matrix, missing entries as `NaN`
pub fn numeric_matrix(df: &DataFrame, columns: &[&str]) -> Result<Array2<f64>> {
    require_columns(df, columns)?;
    let mut matrix = Array2::from_elem((df.height(), columns.len()), f64::NAN);
    for (j, name) in columns.iter().enumerate() {
        for (i, v) in numeric_values(df, name)?.into_iter().enumerate() {
            if let Some(v) = v {
                matrix[[i, j]] = v;
            }
        }
    }
    Ok(matrix)
}

/// Write matrix columns back into the named frame columns, `NaN` as missing
pub fn put_matrix(df: &mut DataFrame, columns: &[&str], matrix: &Array2<f64>) -> Result<()> {
    if matrix.dim() != (df.height(), columns.len()) {
        return Err(SolarError::ShapeError {
            expected: format!("({}, {})", df.height(), columns.len()),
            actual: format!("{:?}", matrix.dim()),
        });
    }
    for (j, name) in columns.iter().enumerate() {
        let values = matrix
            .column(j)
            .iter()
            .map(|&v| if v.is_nan() { None } else { Some(v) })
            .collect();
        put_numeric(df, name, values)?;
    }
    Ok(())
}

/// Number of missing entries in a column, counting unparsable values as missing
pub fn missing_count(df: &DataFrame, name: &str) -> Result<usize> {
    let dtype = df.column(name)?.dtype().clone();
    if dtype.is_primitive_numeric() {
        Ok(numeric_values(df, name)?.iter().filter(|v| v.is_none()).count())
    } else {
        Ok(df.column(name)?.null_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_df() -> DataFrame {
        df!(
            "a" => &[Some(1.0), None, Some(f64::NAN)],
            "b" => &["1.5", "badval", "2"],
        )
        .unwrap()
    }

    #[test]
    fn test_require_columns() {
        let df = sample_df();
        assert!(require_columns(&df, &["a", "b"]).is_ok());
        let err = require_columns(&df, &["a", "zzz"]).unwrap_err();
        assert!(matches!(err, SolarError::ColumnNotFound(ref c) if c == "zzz"));
    }

    #[test]
    fn test_numeric_values_coerce() {
        let df = sample_df();
        assert_eq!(numeric_values(&df, "a").unwrap(), vec![Some(1.0), None, None]);
        assert_eq!(numeric_values(&df, "b").unwrap(), vec![Some(1.5), None, Some(2.0)]);
    }

    #[test]
    fn test_put_numeric_keeps_position() {
        let mut df = sample_df();
        put_numeric(&mut df, "a", vec![Some(9.0), Some(8.0), Some(7.0)]).unwrap();
        assert_eq!(df.get_column_names()[0].as_str(), "a");
        put_numeric(&mut df, "c", vec![None, None, None]).unwrap();
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn test_filter_rows() {
        let df = sample_df();
        let filtered = filter_rows(&df, &[true, false, true]).unwrap();
        assert_eq!(filtered.height(), 2);
        assert!(filter_rows(&df, &[true]).is_err());
    }
}
