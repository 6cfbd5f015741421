//! Model serialization utilities
//!
//! A fitted model is written inside an envelope carrying magic bytes, a
//! format version, metadata and an FNV-1a checksum of the model payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{Result, SolarError};

/// Serialization format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SerializationFormat {
    /// Binary format using bincode
    #[default]
    Binary,
    /// JSON envelope
    Json,
}

impl SerializationFormat {
    /// Pick the format from the file extension, binary unless `.json`
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SerializationFormat::Json,
            _ => SerializationFormat::Binary,
        }
    }
}

/// Model metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Model name
    pub name: String,
    /// Crate version that wrote the artifact
    pub version: String,
    /// Training timestamp
    pub trained_at: DateTime<Utc>,
    /// Input columns the model was fitted on
    pub input_columns: Vec<String>,
    /// Feature names after preprocessing
    pub feature_names: Vec<String>,
    /// Target name
    pub target_name: String,
    /// Hyperparameters
    pub hyperparameters: BTreeMap<String, String>,
    /// Training metrics
    pub metrics: BTreeMap<String, f64>,
}

impl Default for ArtifactMetadata {
    fn default() -> Self {
        Self {
            name: "solar_efficiency_forest".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            trained_at: Utc::now(),
            input_columns: Vec::new(),
            feature_names: Vec::new(),
            target_name: "efficiency".to_string(),
            hyperparameters: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }
}

impl ArtifactMetadata {
    /// Create new metadata with name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_input_columns(mut self, columns: Vec<String>) -> Self {
        self.input_columns = columns;
        self
    }

    /// Set feature names
    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.feature_names = features;
        self
    }

    /// Set target name
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_name = target.into();
        self
    }

    /// Add hyperparameter
    pub fn add_hyperparameter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.hyperparameters.insert(key.into(), value.to_string());
        self
    }

    /// Add metric
    pub fn add_metric(mut self, key: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }
}

/// Envelope written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedModel {
    /// Magic bytes for format detection
    pub magic: [u8; 4],
    /// Format version
    pub format_version: u32,
    /// Model metadata
    pub metadata: ArtifactMetadata,
    /// Bincode-encoded model
    pub model_data: Vec<u8>,
    /// Checksum for integrity verification
    pub checksum: u64,
}

impl SerializedModel {
    pub const MAGIC: [u8; 4] = *b"SOLM";
    pub const VERSION: u32 = 1;

    /// Create new serialized model
    pub fn new(metadata: ArtifactMetadata, model_data: Vec<u8>) -> Self {
        let checksum = Self::compute_checksum(&model_data);
        Self {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            metadata,
            model_data,
            checksum,
        }
    }

    /// Compute checksum using FNV-1a hash
    fn compute_checksum(data: &[u8]) -> u64 {
        const FNV_OFFSET: u64 = 14695981039346656037;
        const FNV_PRIME: u64 = 1099511628211;

        data.iter().fold(FNV_OFFSET, |hash, byte| {
            (hash ^ *byte as u64).wrapping_mul(FNV_PRIME)
        })
    }

    /// Verify checksum
    pub fn verify_checksum(&self) -> bool {
        Self::compute_checksum(&self.model_data) == self.checksum
    }

    /// Check magic, version and checksum
    pub fn validate(&self) -> Result<()> {
        if self.magic != Self::MAGIC {
            return Err(SolarError::SerializationError(
                "Not a model artifact (bad magic bytes)".to_string(),
            ));
        }
        if self.format_version != Self::VERSION {
            return Err(SolarError::SerializationError(format!(
                "Unsupported artifact format version {} (expected {})",
                self.format_version,
                Self::VERSION
            )));
        }
        if !self.verify_checksum() {
            return Err(SolarError::SerializationError(
                "Checksum verification failed - file may be corrupted".to_string(),
            ));
        }
        Ok(())
    }
}

/// Save a serializable model to file, creating parent directories
pub fn save_model<M: Serialize>(
    model: &M,
    path: impl AsRef<Path>,
    metadata: ArtifactMetadata,
    format: SerializationFormat,
) -> Result<()> {
    let path = path.as_ref();
    let model_data = bincode::serialize(model)?;
    let serialized = SerializedModel::new(metadata, model_data);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    match format {
        SerializationFormat::Binary => bincode::serialize_into(&mut writer, &serialized)?,
        SerializationFormat::Json => serde_json::to_writer_pretty(&mut writer, &serialized)?,
    }
    writer.flush()?;

    Ok(())
}

/// Load a model and its metadata from file
pub fn load_model<M: for<'de> Deserialize<'de>>(
    path: impl AsRef<Path>,
    format: SerializationFormat,
) -> Result<(M, ArtifactMetadata)> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(SolarError::FileNotFound(path.to_path_buf()));
    }
    let mut reader = BufReader::new(File::open(path)?);

    let serialized: SerializedModel = match format {
        SerializationFormat::Binary => {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes)?;
            bincode::deserialize(&bytes)?
        }
        SerializationFormat::Json => serde_json::from_reader(&mut reader)?,
    };
    serialized.validate()?;

    let model: M = bincode::deserialize(&serialized.model_data)?;
    Ok((model, serialized.metadata))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestModel {
        weights: Vec<f64>,
        bias: f64,
    }

    fn test_model() -> TestModel {
        TestModel {
            weights: vec![0.1, 0.2, 1.0 / 3.0],
            bias: -0.5,
        }
    }

    #[test]
    fn test_serialized_model_checksum_failure() {
        let mut serialized = SerializedModel::new(ArtifactMetadata::new("test"), vec![1, 2, 3, 4, 5]);
        assert!(serialized.validate().is_ok());

        serialized.model_data[0] = 99;
        assert!(!serialized.verify_checksum());
        assert!(matches!(
            serialized.validate(),
            Err(SolarError::SerializationError(_))
        ));
    }

    #[test]
    fn test_bad_magic() {
        let mut serialized = SerializedModel::new(ArtifactMetadata::new("test"), vec![1]);
        serialized.magic = *b"KOLM";
        assert!(serialized.validate().is_err());
    }

    #[test]
    fn test_metadata_builder() {
        let metadata = ArtifactMetadata::new("forest")
            .with_features(vec!["x1".to_string(), "x2".to_string()])
            .with_target("efficiency")
            .add_hyperparameter("n_estimators", 10)
            .add_metric("r2", 0.95);

        assert_eq!(metadata.feature_names.len(), 2);
        assert_eq!(metadata.hyperparameters["n_estimators"], "10");
        assert_eq!(metadata.metrics["r2"], 0.95);
    }

    #[test]
    fn test_binary_and_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let model = test_model();

        for (name, format) in [
            ("nested/model.bin", SerializationFormat::Binary),
            ("model.json", SerializationFormat::Json),
        ] {
            let path = dir.path().join(name);
            assert_eq!(SerializationFormat::from_path(&path), format);

            save_model(&model, &path, ArtifactMetadata::new("test"), format).unwrap();
            let (loaded, metadata): (TestModel, _) = load_model(&path, format).unwrap();
            assert_eq!(loaded, model);
            assert_eq!(metadata.name, "test");
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result: Result<(TestModel, ArtifactMetadata)> =
            load_model(dir.path().join("absent.bin"), SerializationFormat::Binary);
        assert!(matches!(result, Err(SolarError::FileNotFound(_))));
    }
}
