//! Column-wise preprocessing feeding the regressor

use super::{
    encoder::OneHotEncoder,
    imputer::{ImputeStrategy, SimpleImputer},
};
use crate::error::{Result, SolarError};
use crate::utils::frame::require_columns;
use ndarray::{concatenate, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

/// Turns a feature table into a dense matrix.
///
/// Numeric columns are mean-imputed and passed through; categorical columns
/// are most-frequent-imputed and one-hot encoded. Columns with no observed
/// value at fit time are left out of the output, like sklearn's
/// `SimpleImputer`. Output layout is numeric columns first, then the indicator
/// blocks of the categorical columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnPreprocessor {
    numeric_columns: Vec<String>,
    categorical_columns: Vec<String>,
    numeric_imputer: SimpleImputer,
    categorical_imputer: SimpleImputer,
    encoder: OneHotEncoder,
    is_fitted: bool,
    fit_time_ms: f64,
}

impl ColumnPreprocessor {
    pub fn new() -> Self {
        Self {
            numeric_columns: Vec::new(),
            categorical_columns: Vec::new(),
            numeric_imputer: SimpleImputer::new(ImputeStrategy::Mean),
            categorical_imputer: SimpleImputer::new(ImputeStrategy::MostFrequent),
            encoder: OneHotEncoder::new(),
            is_fitted: false,
            fit_time_ms: 0.0,
        }
    }

    /// Fit on a feature table.
    ///
    /// `categorical` names the categorical columns; every other column not in
    /// `exclude` is treated as numeric.
    pub fn fit(&mut self, df: &DataFrame, categorical: &[&str], exclude: &[&str]) -> Result<&mut Self> {
        let start = Instant::now();
        require_columns(df, categorical)?;

        let numeric: Vec<&str> = df
            .get_column_names()
            .into_iter()
            .map(|n| n.as_str())
            .filter(|n| !categorical.contains(n) && !exclude.contains(n))
            .collect();

        self.numeric_imputer.fit(df, &numeric)?;
        self.categorical_imputer.fit(df, categorical)?;

        for col in self
            .numeric_imputer
            .empty_columns()
            .iter()
            .chain(self.categorical_imputer.empty_columns().iter())
        {
            warn!(column = %col, "Column has no observed values, leaving it out of the features");
        }

        self.numeric_columns = self.numeric_imputer.fitted_columns();
        self.categorical_columns = self.categorical_imputer.fitted_columns();

        let imputed = self.imputed_categoricals(df)?;
        self.encoder.fit(&imputed)?;

        self.is_fitted = true;
        self.fit_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!(
            numeric = self.numeric_columns.len(),
            categorical = self.categorical_columns.len(),
            n_features = self.n_features(),
            "Column preprocessor fitted"
        );
        Ok(self)
    }

    /// Transform a feature table into the model matrix
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(SolarError::ModelNotFitted);
        }

        let n_rows = df.height();
        let mut numeric = Array2::zeros((n_rows, self.numeric_columns.len()));
        for (j, name) in self.numeric_columns.iter().enumerate() {
            let values = self.numeric_imputer.transform_numeric(df, name)?;
            for (i, v) in values.into_iter().enumerate() {
                numeric[[i, j]] = v;
            }
        }

        let encoded = if self.categorical_columns.is_empty() {
            Array2::zeros((n_rows, 0))
        } else {
            self.encoder.transform(&self.imputed_categoricals(df)?)?
        };

        Ok(concatenate(Axis(1), &[numeric.view(), encoded.view()])?)
    }

    /// Fit and transform in one step
    pub fn fit_transform(
        &mut self,
        df: &DataFrame,
        categorical: &[&str],
        exclude: &[&str],
    ) -> Result<Array2<f64>> {
        self.fit(df, categorical, exclude)?;
        self.transform(df)
    }

    fn imputed_categoricals(&self, df: &DataFrame) -> Result<Vec<(String, Vec<String>)>> {
        self.categorical_columns
            .iter()
            .map(|name| Ok((name.clone(), self.categorical_imputer.transform_text(df, name)?)))
            .collect()
    }

    /// Names of the output matrix columns
    pub fn feature_names(&self) -> Vec<String> {
        self.numeric_columns
            .iter()
            .cloned()
            .chain(self.encoder.feature_names())
            .collect()
    }

    pub fn n_features(&self) -> usize {
        self.numeric_columns.len() + self.encoder.n_outputs()
    }

    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    pub fn categorical_columns(&self) -> &[String] {
        &self.categorical_columns
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn fit_time_ms(&self) -> f64 {
        self.fit_time_ms
    }
}

impl Default for ColumnPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}
