//! The five-stage solar efficiency pipeline
//!
//! Each stage module exposes typed table-in/table-out transforms; the
//! [`stages`] runners wire them to the on-disk checkpoints described by
//! [`CheckpointLayout`].

mod config;
pub mod feature_engineering;
pub mod ingestion;
pub mod missing_values;
pub mod model_training;
pub mod stages;
pub mod submission;

pub use config::{CheckpointLayout, PipelineConfig, SubmissionInput};
pub use model_training::{FittedPipeline, ModelArtifact};
pub use stages::{
    run_all, run_feature_engineering, run_imputation, run_ingestion, run_submission, run_training,
    Stage, StageReport,
};
