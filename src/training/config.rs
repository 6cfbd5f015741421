//! Training parameters read from the params file

use super::random_forest::MaxFeatures;
use crate::error::{Result, SolarError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level key holding the model parameters
pub const PARAMS_KEY: &str = "model_prediction";

/// Forest size and seed for the training stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub n_estimators: usize,
    pub random_state: u64,
    /// Optional, every feature is considered at each split when absent
    #[serde(default)]
    pub max_features: MaxFeatures,
}

impl Default for ParameterRecord {
    fn default() -> Self {
        Self::new(100, 42)
    }
}

impl ParameterRecord {
    pub fn new(n_estimators: usize, random_state: u64) -> Self {
        Self {
            n_estimators,
            random_state,
            max_features: MaxFeatures::All,
        }
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Parse the record from YAML text
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let doc: serde_yaml::Value = serde_yaml::from_str(text)?;
        let section = doc.get(PARAMS_KEY).ok_or_else(|| {
            SolarError::ConfigError(format!("Missing top-level key '{}'", PARAMS_KEY))
        })?;
        let record: ParameterRecord = serde_yaml::from_value(section.clone())?;

        if record.n_estimators == 0 {
            return Err(SolarError::ConfigError(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        Ok(record)
    }
}

/// Load the parameter record from a YAML file
pub fn load_parameters(path: impl AsRef<Path>) -> Result<ParameterRecord> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(SolarError::FileNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    let record = ParameterRecord::from_yaml_str(&text)?;
    tracing::debug!(
        path = %path.display(),
        n_estimators = record.n_estimators,
        random_state = record.random_state,
        "Parameters loaded"
    );
    Ok(record)
}
