//! Simple per-column imputation for the model preprocessor

use crate::error::{Result, SolarError};
use crate::utils::frame::{numeric_values, text_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Strategy for imputing missing values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace with mean (numeric only)
    Mean,
    /// Replace with the most frequent value, the smallest one on ties
    MostFrequent,
}

/// Learned fill value for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeValue {
    Numeric(f64),
    String(String),
}

/// Imputer for handling missing values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleImputer {
    strategy: ImputeStrategy,
    /// Fitted columns in fit order, `None` when the column had no observed value
    fill_values: Vec<(String, Option<ImputeValue>)>,
    is_fitted: bool,
}

impl SimpleImputer {
    /// Create a new imputer with the specified strategy
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_values: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn strategy(&self) -> &ImputeStrategy {
        &self.strategy
    }

    /// Fit the imputer to the data
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.fill_values.clear();
        for col_name in columns {
            let fill = match self.strategy {
                ImputeStrategy::Mean => {
                    Self::compute_mean(&numeric_values(df, col_name)?).map(ImputeValue::Numeric)
                }
                ImputeStrategy::MostFrequent => {
                    Self::compute_mode_string(&text_values(df, col_name)?).map(ImputeValue::String)
                }
            };
            self.fill_values.push((col_name.to_string(), fill));
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Columns that can be imputed, i.e. had at least one observed value at fit time
    pub fn fitted_columns(&self) -> Vec<String> {
        self.fill_values
            .iter()
            .filter(|(_, fill)| fill.is_some())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Columns with no observed value at fit time
    pub fn empty_columns(&self) -> Vec<String> {
        self.fill_values
            .iter()
            .filter(|(_, fill)| fill.is_none())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Fill value learned for a column
    pub fn fill_value(&self, column: &str) -> Option<&ImputeValue> {
        self.fill_values
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, fill)| fill.as_ref())
    }

    /// Imputed numeric values of a fitted column
    pub fn transform_numeric(&self, df: &DataFrame, column: &str) -> Result<Vec<f64>> {
        let fill = match self.fitted_fill(column)? {
            ImputeValue::Numeric(v) => *v,
            ImputeValue::String(_) => {
                return Err(SolarError::ValidationError(format!(
                    "Column {} was fitted with a text fill value",
                    column
                )))
            }
        };
        Ok(numeric_values(df, column)?
            .into_iter()
            .map(|v| v.unwrap_or(fill))
            .collect())
    }

    /// Imputed text values of a fitted column
    pub fn transform_text(&self, df: &DataFrame, column: &str) -> Result<Vec<String>> {
        let fill = match self.fitted_fill(column)? {
            ImputeValue::String(s) => s.clone(),
            ImputeValue::Numeric(v) => v.to_string(),
        };
        Ok(text_values(df, column)?
            .into_iter()
            .map(|v| v.unwrap_or_else(|| fill.clone()))
            .collect())
    }

    fn fitted_fill(&self, column: &str) -> Result<&ImputeValue> {
        if !self.is_fitted {
            return Err(SolarError::ModelNotFitted);
        }
        self.fill_value(column).ok_or_else(|| {
            SolarError::ValidationError(format!("Column {} has no fitted fill value", column))
        })
    }

    fn compute_mean(values: &[Option<f64>]) -> Option<f64> {
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        if present.is_empty() {
            None
        } else {
            Some(present.iter().sum::<f64>() / present.len() as f64)
        }
    }

    /// Compute mode for string values; ties resolve to the smallest value
    fn compute_mode_string(values: &[Option<String>]) -> Option<String> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for val in values.iter().flatten() {
            *counts.entry(val.as_str()).or_insert(0) += 1;
        }

        // BTreeMap iterates in ascending order, so keep the first maximum
        let mut best: Option<(&str, usize)> = None;
        for (val, count) in counts {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((val, count));
            }
        }
        best.map(|(val, _)| val.to_string())
    }
}
