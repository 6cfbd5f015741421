//! KNN-based imputation

use crate::error::{Result, SolarError};
use crate::imputation::{is_missing, Imputer};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How neighbor values are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightScheme {
    /// Plain average of the neighbors
    #[default]
    Uniform,
    /// Inverse-distance weighted average
    Distance,
}

/// KNN-based imputer.
///
/// Distances use the NaN-aware euclidean metric: only coordinates present in
/// both rows contribute, and the sum is rescaled by
/// `n_features / n_present` before the square root. For each missing entry
/// the donors are the fitted rows that have that feature present; when no
/// donor is at a finite distance the feature's fitted mean is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNNImputer {
    /// Number of neighbors
    n_neighbors: usize,
    /// Weights for averaging
    weights: WeightScheme,
    /// Fitted rows, NaN marks missing
    fit_data: Option<Array2<f64>>,
    /// Per-feature mean over present values, `None` when a feature is entirely missing
    feature_means: Option<Vec<Option<f64>>>,
}

impl KNNImputer {
    /// Create new KNN imputer
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1),
            weights: WeightScheme::Uniform,
            fit_data: None,
            feature_means: None,
        }
    }

    /// Set weighting scheme
    pub fn with_weights(mut self, weights: WeightScheme) -> Self {
        self.weights = weights;
        self
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    /// Features with no present value in the fitted data
    pub fn empty_features(&self) -> Vec<usize> {
        self.feature_means
            .as_ref()
            .map(|means| {
                means
                    .iter()
                    .enumerate()
                    .filter(|(_, m)| m.is_none())
                    .map(|(j, _)| j)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// NaN-aware euclidean distance, `None` when the rows share no present coordinate
    fn distance(a: &[f64], b: &[f64]) -> Option<f64> {
        let mut present = 0usize;
        let mut accum = 0.0f64;

        for (&ai, &bi) in a.iter().zip(b.iter()) {
            if is_missing(ai) || is_missing(bi) {
                continue;
            }
            present += 1;
            let d = ai - bi;
            accum += d * d;
        }

        if present == 0 {
            return None;
        }

        let scale = a.len() as f64 / present as f64;
        Some((scale * accum).sqrt())
    }

    /// Combine the donor values for one feature
    fn impute_value(&self, donors: &[(usize, f64)], feature_idx: usize, data: &Array2<f64>) -> f64 {
        match self.weights {
            WeightScheme::Uniform => {
                let sum: f64 = donors.iter().map(|&(idx, _)| data[[idx, feature_idx]]).sum();
                sum / donors.len() as f64
            }
            WeightScheme::Distance => {
                // Exact matches take all the weight
                let exact: Vec<f64> = donors
                    .iter()
                    .filter(|&&(_, d)| d == 0.0)
                    .map(|&(idx, _)| data[[idx, feature_idx]])
                    .collect();
                if !exact.is_empty() {
                    return exact.iter().sum::<f64>() / exact.len() as f64;
                }

                let mut weighted_sum = 0.0;
                let mut weight_sum = 0.0;
                for &(idx, dist) in donors {
                    let weight = 1.0 / dist;
                    weighted_sum += data[[idx, feature_idx]] * weight;
                    weight_sum += weight;
                }
                weighted_sum / weight_sum
            }
        }
    }
}

impl Default for KNNImputer {
    fn default() -> Self {
        Self::new(5)
    }
}

impl Imputer for KNNImputer {
    fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        if x.nrows() == 0 {
            return Err(SolarError::ValidationError(
                "Cannot fit KNN imputer on an empty table".to_string(),
            ));
        }

        let feature_means = x
            .columns()
            .into_iter()
            .map(|col| {
                let present: Vec<f64> = col.iter().copied().filter(|v| !is_missing(*v)).collect();
                if present.is_empty() {
                    None
                } else {
                    Some(present.iter().sum::<f64>() / present.len() as f64)
                }
            })
            .collect();

        self.fit_data = Some(x.as_standard_layout().to_owned());
        self.feature_means = Some(feature_means);
        Ok(())
    }

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (data, means) = match (&self.fit_data, &self.feature_means) {
            (Some(d), Some(m)) => (d, m),
            _ => return Err(SolarError::ModelNotFitted),
        };

        if x.ncols() != data.ncols() {
            return Err(SolarError::ShapeError {
                expected: format!("{} columns", data.ncols()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut result = x.clone();
        let n_features = x.ncols();
        let mut row_buf: Vec<f64> = Vec::with_capacity(n_features);
        let mut fit_buf: Vec<f64> = Vec::with_capacity(n_features);

        for (row_idx, row) in x.rows().into_iter().enumerate() {
            if !row.iter().any(|&v| is_missing(v)) {
                continue;
            }

            row_buf.clear();
            row_buf.extend(row.iter().copied());

            // Distance from this row to every fitted row, computed once per row
            let distances: Vec<Option<f64>> = data
                .rows()
                .into_iter()
                .map(|fit_row| {
                    fit_buf.clear();
                    fit_buf.extend(fit_row.iter().copied());
                    Self::distance(&row_buf, &fit_buf)
                })
                .collect();

            for j in 0..n_features {
                if !is_missing(row_buf[j]) {
                    continue;
                }

                let mut donors: Vec<(usize, f64)> = distances
                    .iter()
                    .enumerate()
                    .filter_map(|(i, d)| d.map(|d| (i, d)))
                    .filter(|&(i, _)| !is_missing(data[[i, j]]))
                    .collect();

                // Stable sort keeps the earlier row on equal distances
                donors.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
                donors.truncate(self.n_neighbors);

                let value = if donors.is_empty() {
                    // No comparable donor: fall back to the mean, or stay missing
                    means[j].unwrap_or(f64::NAN)
                } else {
                    self.impute_value(&donors, j, data)
                };
                result[[row_idx, j]] = value;
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_knn_imputer_basic() {
        let data = Array2::from_shape_vec(
            (6, 2),
            vec![
                1.0, 10.0,
                2.0, 20.0,
                3.0, 30.0,
                4.0, 40.0,
                f64::NAN, 25.0,
                2.5, f64::NAN,
            ],
        )
        .unwrap();

        let mut imputer = KNNImputer::new(3);
        let result = imputer.fit_transform(&data).unwrap();

        assert!(!result.iter().any(|v| v.is_nan()));
        // Neighbors of 25.0 are the rows at 20, 30 and then 10 (ties keep row order)
        assert_relative_eq!(result[[4, 0]], 2.0);
        // Neighbors of 2.5 are the rows at 2, 3 and 1
        assert_relative_eq!(result[[5, 1]], 20.0);
    }

    #[test]
    fn test_single_column_falls_back_to_mean() {
        // A lone missing feature shares no coordinate with any donor
        let data = Array2::from_shape_vec((4, 1), vec![1.0, f64::NAN, 3.0, 8.0]).unwrap();

        let mut imputer = KNNImputer::new(3);
        let result = imputer.fit_transform(&data).unwrap();

        assert_relative_eq!(result[[1, 0]], 4.0);
    }

    #[test]
    fn test_distance_weights() {
        let data = Array2::from_shape_vec(
            (5, 2),
            vec![
                0.0, 0.0,
                1.0, 1.0,
                2.0, 2.0,
                3.0, 3.0,
                0.1, f64::NAN,
            ],
        )
        .unwrap();

        let mut imputer = KNNImputer::new(3).with_weights(WeightScheme::Distance);
        let result = imputer.fit_transform(&data).unwrap();

        assert!(result[[4, 1]] < 1.0);
    }

    #[test]
    fn test_entirely_missing_feature_stays_missing() {
        let data = Array2::from_shape_vec(
            (3, 2),
            vec![1.0, f64::NAN, 2.0, f64::NAN, 3.0, f64::NAN],
        )
        .unwrap();

        let mut imputer = KNNImputer::new(3);
        let result = imputer.fit_transform(&data).unwrap();

        assert_eq!(imputer.empty_features(), vec![1]);
        assert_eq!(result.dim(), (3, 2));
        assert!(result.column(1).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_transform_requires_fit() {
        let imputer = KNNImputer::new(3);
        let data = Array2::<f64>::zeros((2, 2));
        assert!(matches!(imputer.transform(&data), Err(SolarError::ModelNotFitted)));
    }
}
