//! Outlier clipping with the interquartile-range rule
//!
//! Bounds are learned from one table and can be applied to any table with the
//! same columns. Quantiles use linear interpolation between order statistics.

use crate::error::{Result, SolarError};
use crate::utils::frame::{numeric_values, put_numeric};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Fitted bounds for a column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl OutlierBounds {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Clip a value into `[lower, upper]`
    #[inline]
    pub fn clip(&self, v: f64) -> f64 {
        v.max(self.lower).min(self.upper)
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.lower && v <= self.upper
    }
}

/// IQR outlier detector that clips values to the fitted fences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierDetector {
    factor: f64,
    columns: Vec<String>,
    bounds: Vec<(String, OutlierBounds)>,
    is_fitted: bool,
}

impl OutlierDetector {
    /// Detector with fences at `Q1 - factor * IQR` and `Q3 + factor * IQR`
    pub fn iqr(factor: f64) -> Self {
        Self {
            factor,
            columns: Vec::new(),
            bounds: Vec::new(),
            is_fitted: false,
        }
    }

    /// Set columns to process
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    /// Learn bounds from the given table
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.bounds.clear();
        for col_name in &self.columns {
            let mut values: Vec<f64> = numeric_values(df, col_name)?.into_iter().flatten().collect();
            values.sort_by(f64::total_cmp);

            let bounds = match (quantile_linear(&values, 0.25), quantile_linear(&values, 0.75)) {
                (Some(q1), Some(q3)) => {
                    let iqr = q3 - q1;
                    OutlierBounds {
                        q1,
                        q3,
                        lower: q1 - self.factor * iqr,
                        upper: q3 + self.factor * iqr,
                    }
                }
                // No observed value: nothing to clip
                _ => OutlierBounds {
                    q1: f64::NAN,
                    q3: f64::NAN,
                    lower: f64::NEG_INFINITY,
                    upper: f64::INFINITY,
                },
            };
            self.bounds.push((col_name.clone(), bounds));
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Clip the fitted columns, missing entries stay missing
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(SolarError::ModelNotFitted);
        }

        let mut result = df.clone();
        for (col_name, bounds) in &self.bounds {
            let clipped = numeric_values(df, col_name)?
                .into_iter()
                .map(|v| v.map(|x| bounds.clip(x)))
                .collect();
            put_numeric(&mut result, col_name, clipped)?;
        }
        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Get fitted bounds for a column
    pub fn bounds(&self, column: &str) -> Option<&OutlierBounds> {
        self.bounds
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, b)| b)
    }
}

impl Default for OutlierDetector {
    fn default() -> Self {
        Self::iqr(1.5)
    }
}

/// Quantile of sorted values with linear interpolation, `None` when empty
pub fn quantile_linear(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn create_test_df() -> DataFrame {
        df!(
            "power" => &[Some(1.0), Some(2.0), Some(3.0), Some(4.0), None, Some(100.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_quantile_linear() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(quantile_linear(&values, 0.25).unwrap(), 1.75);
        assert_relative_eq!(quantile_linear(&values, 0.75).unwrap(), 3.25);
        assert_relative_eq!(quantile_linear(&[5.0], 0.25).unwrap(), 5.0);
        assert!(quantile_linear(&[], 0.5).is_none());
    }

    #[test]
    fn test_bounds_computation() {
        let mut detector = OutlierDetector::iqr(1.5).with_columns(vec!["power".into()]);
        detector.fit(&create_test_df()).unwrap();

        // Present values [1, 2, 3, 4, 100]: Q1 = 2, Q3 = 4
        let bounds = detector.bounds("power").unwrap();
        assert_relative_eq!(bounds.q1, 2.0);
        assert_relative_eq!(bounds.q3, 4.0);
        assert_relative_eq!(bounds.lower, -1.0);
        assert_relative_eq!(bounds.upper, 7.0);
    }

    #[test]
    fn test_clip_strategy() {
        let mut detector = OutlierDetector::default().with_columns(vec!["power".into()]);
        let clipped = detector.fit_transform(&create_test_df()).unwrap();

        let values = numeric_values(&clipped, "power").unwrap();
        assert_eq!(values[5], Some(7.0));
        assert_eq!(values[0], Some(1.0));
        assert_eq!(values[4], None);
    }

    #[test]
    fn test_zero_iqr_collapses_to_point() {
        let df = df!("power" => &[5.0, 5.0, 5.0, 5.0, 9.0]).unwrap();
        let mut detector = OutlierDetector::default().with_columns(vec!["power".into()]);
        let clipped = detector.fit_transform(&df).unwrap();

        let values = numeric_values(&clipped, "power").unwrap();
        assert!(values.iter().all(|v| *v == Some(5.0)));
    }

    #[test]
    fn test_transform_requires_fit() {
        let detector = OutlierDetector::default().with_columns(vec!["power".into()]);
        assert!(matches!(
            detector.transform(&create_test_df()),
            Err(SolarError::ModelNotFitted)
        ));
    }
}
