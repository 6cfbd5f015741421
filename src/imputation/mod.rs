//! Missing value imputation
//!
//! Provides the k-nearest-neighbor imputer used by the imputation stage,
//! operating on dense matrices where `NaN` marks a missing entry.

mod knn;

pub use knn::{KNNImputer, WeightScheme};

use crate::error::Result;
use ndarray::Array2;

/// Trait for imputers
pub trait Imputer {
    /// Fit the imputer on data with missing values
    fn fit(&mut self, x: &Array2<f64>) -> Result<()>;

    /// Transform data by imputing missing values
    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    /// Fit and transform in one step
    fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}

/// Check if value is missing (NaN)
#[inline]
pub fn is_missing(v: f64) -> bool {
    v.is_nan()
}
