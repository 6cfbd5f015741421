//! Solar efficiency - batch preparation and training pipeline
//!
//! Predicts solar panel efficiency from sensor readings in five stages:
//! ingestion, feature engineering, imputation, model training and
//! submission. Each stage reads its predecessor's CSV checkpoint and writes
//! its own.
//!
//! # Modules
//!
//! ## Pipeline
//! - [`pipeline`] - Stage transforms, stage runners and configuration
//!
//! ## Core ML Modules
//! - [`preprocessing`] - Mean/mode imputation, one-hot encoding, IQR clipping
//! - [`imputation`] - K-nearest-neighbor imputation
//! - [`training`] - Decision trees and the random forest regressor
//! - [`export`] - Checksummed model artifacts
//!
//! ## Services
//! - [`cli`] - Command-line interface
//! - [`utils`] - CSV I/O, frame helpers and diagnostics setup

// Core error handling
pub mod error;

// Core ML modules
pub mod preprocessing;
pub mod imputation;
pub mod training;
pub mod export;

// Pipeline stages
pub mod pipeline;

// Utilities and services
pub mod utils;
pub mod cli;

pub use error::{Result, SolarError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, SolarError};

    // Pipeline
    pub use crate::pipeline::{
        run_all, CheckpointLayout, ModelArtifact, PipelineConfig, Stage, StageReport,
        SubmissionInput,
    };

    // Preprocessing
    pub use crate::preprocessing::{ColumnPreprocessor, OneHotEncoder, OutlierDetector, SimpleImputer};

    // Imputation
    pub use crate::imputation::{Imputer, KNNImputer};

    // Training
    pub use crate::training::{load_parameters, ParameterRecord, RandomForest};

    // Export
    pub use crate::export::{ArtifactMetadata, SerializationFormat};

    // I/O
    pub use crate::utils::{DataLoader, DataSaver};
}
