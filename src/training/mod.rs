//! Model training module
//!
//! Provides the regression forest used by the training stage:
//! - Decision trees with squared-error splits
//! - Bootstrapped random forests built in parallel
//! - Parameter loading and regression metrics

mod config;
pub mod decision_tree;
mod metrics;
pub mod random_forest;

pub use config::{load_parameters, ParameterRecord, PARAMS_KEY};
pub use decision_tree::{DecisionTree, TreeNode};
pub use metrics::RegressionMetrics;
pub use random_forest::{MaxFeatures, RandomForest};
