//! One-hot encoding for categorical columns

use crate::error::{Result, SolarError};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Categories learned for one column, in sorted order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnCategories {
    pub column: String,
    pub categories: Vec<String>,
}

/// One-hot encoder over already-imputed text columns.
///
/// Categories unseen at fit time encode to an all-zero indicator block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneHotEncoder {
    columns: Vec<ColumnCategories>,
    is_fitted: bool,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the sorted category set of each column
    pub fn fit(&mut self, columns: &[(String, Vec<String>)]) -> Result<&mut Self> {
        self.columns = columns
            .iter()
            .map(|(name, values)| {
                let categories: BTreeSet<&str> = values.iter().map(String::as_str).collect();
                ColumnCategories {
                    column: name.clone(),
                    categories: categories.into_iter().map(str::to_string).collect(),
                }
            })
            .collect();
        self.is_fitted = true;
        Ok(self)
    }

    /// Total number of indicator columns
    pub fn n_outputs(&self) -> usize {
        self.columns.iter().map(|c| c.categories.len()).sum()
    }

    /// Output names as `<column>_<category>`
    pub fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(|c| {
                c.categories
                    .iter()
                    .map(move |cat| format!("{}_{}", c.column, cat))
            })
            .collect()
    }

    pub fn categories(&self) -> &[ColumnCategories] {
        &self.columns
    }

    /// Encode columns given in fit order into a dense indicator matrix
    pub fn transform(&self, columns: &[(String, Vec<String>)]) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(SolarError::ModelNotFitted);
        }
        if columns.len() != self.columns.len() {
            return Err(SolarError::ShapeError {
                expected: format!("{} categorical columns", self.columns.len()),
                actual: format!("{} categorical columns", columns.len()),
            });
        }

        let n_rows = columns.first().map_or(0, |(_, v)| v.len());
        let mut out = Array2::zeros((n_rows, self.n_outputs()));

        let mut offset = 0;
        for (fitted, (name, values)) in self.columns.iter().zip(columns) {
            if &fitted.column != name {
                return Err(SolarError::ValidationError(format!(
                    "Expected categorical column {}, got {}",
                    fitted.column, name
                )));
            }
            if values.len() != n_rows {
                return Err(SolarError::ShapeError {
                    expected: format!("{} rows", n_rows),
                    actual: format!("{} rows", values.len()),
                });
            }
            for (i, value) in values.iter().enumerate() {
                if let Ok(pos) = fitted.categories.binary_search(value) {
                    out[[i, offset + pos]] = 1.0;
                }
            }
            offset += fitted.categories.len();
        }

        Ok(out)
    }
}
