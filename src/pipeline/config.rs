//! Pipeline configuration and checkpoint layout

use crate::error::{Result, SolarError};
use crate::imputation::{KNNImputer, WeightScheme};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which checkpoint table the submission stage scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionInput {
    /// Imputed test table
    ImputedTest,
    /// Imputed train table
    ImputedTrain,
}

/// Everything the stages need: paths, column lists and neighbor count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Raw training table
    pub raw_train: PathBuf,
    /// Raw test table
    pub raw_test: PathBuf,
    /// Root directory for the stage checkpoints
    pub data_dir: PathBuf,
    /// Parameter file read by the training stage
    pub params_path: PathBuf,
    /// Model artifact, JSON when the extension is `.json`
    pub model_path: PathBuf,
    /// Directory for the error log file
    pub log_dir: PathBuf,
    pub id_column: String,
    pub target_column: String,
    /// Columns coerced to numeric at ingestion
    pub numeric_coercion_columns: Vec<String>,
    /// Column squared into `power`
    pub power_source_column: String,
    /// Column dropped before imputation
    pub unreliable_column: String,
    /// Column imputed on its own before the feature block
    pub single_impute_column: String,
    /// Columns imputed jointly
    pub knn_feature_columns: Vec<String>,
    /// Categorical columns filled with their mode
    pub mode_fill_columns: Vec<String>,
    /// Categorical columns one-hot encoded by the model
    pub categorical_columns: Vec<String>,
    /// Strings treated as missing before training and prediction
    pub sentinel_values: Vec<String>,
    pub n_neighbors: usize,
    /// How neighbor values are averaged
    pub knn_weights: WeightScheme,
    pub submission_input: SubmissionInput,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_train: PathBuf::from("Master_dataset/train.csv"),
            raw_test: PathBuf::from("Master_dataset/test.csv"),
            data_dir: PathBuf::from("data"),
            params_path: PathBuf::from("params.yaml"),
            model_path: PathBuf::from("model.bin"),
            log_dir: PathBuf::from("logs"),
            id_column: "id".to_string(),
            target_column: "efficiency".to_string(),
            numeric_coercion_columns: strings(&["humidity", "wind_speed", "pressure"]),
            power_source_column: "current".to_string(),
            unreliable_column: "temperature".to_string(),
            single_impute_column: "humidity".to_string(),
            knn_feature_columns: strings(&[
                "irradiance",
                "panel_age",
                "soiling_ratio",
                "voltage",
                "current",
                "module_temperature",
                "cloud_coverage",
                "wind_speed",
                "pressure",
                "maintenance_count",
                "power",
            ]),
            mode_fill_columns: strings(&["error_code", "installation_type"]),
            categorical_columns: strings(&["string_id", "error_code", "installation_type"]),
            sentinel_values: strings(&["unknown", "badval", "error"]),
            n_neighbors: 3,
            knn_weights: WeightScheme::Uniform,
            submission_input: SubmissionInput::ImputedTest,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from YAML, unspecified keys keep their defaults
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SolarError::FileNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no stage can run with
    pub fn validate(&self) -> Result<()> {
        if self.n_neighbors == 0 {
            return Err(SolarError::ConfigError("n_neighbors must be at least 1".to_string()));
        }
        if self.knn_feature_columns.is_empty() {
            return Err(SolarError::ConfigError(
                "knn_feature_columns must not be empty".to_string(),
            ));
        }
        if self.id_column == self.target_column {
            return Err(SolarError::ConfigError(
                "id_column and target_column must differ".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_raw_inputs(mut self, train: impl Into<PathBuf>, test: impl Into<PathBuf>) -> Self {
        self.raw_train = train.into();
        self.raw_test = test.into();
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_params_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.params_path = path.into();
        self
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_power_source_column(mut self, column: impl Into<String>) -> Self {
        self.power_source_column = column.into();
        self
    }

    pub fn with_n_neighbors(mut self, k: usize) -> Self {
        self.n_neighbors = k;
        self
    }

    pub fn with_knn_weights(mut self, weights: WeightScheme) -> Self {
        self.knn_weights = weights;
        self
    }

    /// Unfitted imputer carrying the configured neighbor settings
    pub fn knn_imputer(&self) -> KNNImputer {
        KNNImputer::new(self.n_neighbors).with_weights(self.knn_weights)
    }

    pub fn with_submission_input(mut self, input: SubmissionInput) -> Self {
        self.submission_input = input;
        self
    }

    /// Checkpoint files derived from `data_dir`
    pub fn layout(&self) -> CheckpointLayout {
        CheckpointLayout::new(&self.data_dir)
    }
}

/// Fixed file locations each stage writes and its successor reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointLayout {
    pub ingested_train: PathBuf,
    pub ingested_test: PathBuf,
    pub featured_train: PathBuf,
    pub featured_test: PathBuf,
    pub imputed_train: PathBuf,
    pub imputed_test: PathBuf,
    pub submission: PathBuf,
}

impl CheckpointLayout {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            ingested_train: data_dir.join("raw").join("train.csv"),
            ingested_test: data_dir.join("raw").join("test.csv"),
            featured_train: data_dir.join("processed").join("train1.csv"),
            featured_test: data_dir.join("processed").join("test1.csv"),
            imputed_train: data_dir.join("imputations").join("train_missing_imputation.csv"),
            imputed_test: data_dir.join("imputations").join("test_missing_imputation.csv"),
            submission: data_dir.join("submission").join("submission.csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.n_neighbors, 3);
        assert_eq!(config.power_source_column, "current");
        assert_eq!(config.knn_feature_columns.len(), 11);
        assert_eq!(config.knn_weights, WeightScheme::Uniform);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_layout() {
        let layout = PipelineConfig::new().with_data_dir("/tmp/run").layout();
        assert_eq!(layout.featured_train, PathBuf::from("/tmp/run/processed/train1.csv"));
        assert_eq!(
            layout.imputed_test,
            PathBuf::from("/tmp/run/imputations/test_missing_imputation.csv")
        );
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.yaml");
        std::fs::write(
            &path,
            "n_neighbors: 5\nknn_weights: distance\nsubmission_input: imputed_train\n",
        )
        .unwrap();

        let config = PipelineConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.n_neighbors, 5);
        assert_eq!(config.knn_weights, WeightScheme::Distance);
        assert_eq!(config.knn_imputer().n_neighbors(), 5);
        assert_eq!(config.submission_input, SubmissionInput::ImputedTrain);
        assert_eq!(config.target_column, "efficiency");
    }

    #[test]
    fn test_invalid_neighbors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.yaml");
        std::fs::write(&path, "n_neighbors: 0\n").unwrap();

        assert!(matches!(
            PipelineConfig::from_yaml_file(&path),
            Err(SolarError::ConfigError(_))
        ));
    }
}
