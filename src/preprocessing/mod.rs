//! Data preprocessing module
//!
//! Provides the preprocessing pieces used by feature engineering and model
//! training:
//! - Mean and most-frequent imputation
//! - One-hot encoding with unknown categories mapped to zeros
//! - Outlier clipping with the IQR rule

mod encoder;
mod imputer;
pub mod outlier;
mod pipeline;

pub use encoder::{ColumnCategories, OneHotEncoder};
pub use imputer::{ImputeStrategy, ImputeValue, SimpleImputer};
pub use outlier::{OutlierBounds, OutlierDetector};
pub use pipeline::ColumnPreprocessor;
