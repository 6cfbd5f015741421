//! Model persistence
//!
//! Writes fitted models as checksummed artifacts in binary or JSON form.

pub mod serializer;

pub use serializer::{load_model, save_model, ArtifactMetadata, SerializationFormat, SerializedModel};
