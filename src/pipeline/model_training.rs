//! Stage 4: fit the preprocessing + forest pipeline and wrap it as an artifact

use crate::error::{Result, SolarError};
use crate::export::{load_model, save_model, ArtifactMetadata, SerializationFormat};
use crate::preprocessing::ColumnPreprocessor;
use crate::training::{ParameterRecord, RandomForest, RegressionMetrics};
use crate::utils::frame::{numeric_values, put_text, require_columns, text_values};
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Replace sentinel strings with missing values in every text column
pub fn sanitize_table(df: &DataFrame, sentinels: &[&str]) -> Result<DataFrame> {
    let mut out = df.clone();
    let text_columns: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| c.dtype() == &DataType::String)
        .map(|c| c.name().to_string())
        .collect();

    for name in &text_columns {
        let values = text_values(df, name)?
            .into_iter()
            .map(|v| v.filter(|s| !sentinels.contains(&s.as_str())))
            .collect();
        put_text(&mut out, name, values)?;
    }
    Ok(out)
}

/// Sentinel replacement on both tables
pub fn sanitize(
    train: &DataFrame,
    test: &DataFrame,
    sentinels: &[&str],
) -> Result<(DataFrame, DataFrame)> {
    Ok((sanitize_table(train, sentinels)?, sanitize_table(test, sentinels)?))
}

/// Separate the target column from the features
pub fn split_features_target(train: &DataFrame, target: &str) -> Result<(DataFrame, Array1<f64>)> {
    require_columns(train, &[target])?;
    let y: Vec<f64> = numeric_values(train, target)?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| SolarError::DataError(format!("Target {} is missing at row {}", target, row)))
        })
        .collect::<Result<_>>()?;
    Ok((train.drop(target)?, Array1::from_vec(y)))
}

/// Fitted preprocessing and regressor, the part of the artifact that is pickled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedPipeline {
    pub preprocessor: ColumnPreprocessor,
    pub forest: RandomForest,
}

/// Self-contained trained model: needs nothing else to predict
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    pipeline: FittedPipeline,
    metadata: ArtifactMetadata,
}

impl ModelArtifact {
    /// Predict one value per row, in row order
    pub fn predict(&self, df: &DataFrame) -> Result<Array1<f64>> {
        let x = self.pipeline.preprocessor.transform(df)?;
        self.pipeline.forest.predict(&x)
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    /// Record the name of the predicted column
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.metadata = self.metadata.with_target(target);
        self
    }

    pub fn preprocessor(&self) -> &ColumnPreprocessor {
        &self.pipeline.preprocessor
    }

    pub fn forest(&self) -> &RandomForest {
        &self.pipeline.forest
    }

    /// Persist, binary unless the path ends in `.json`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        save_model(
            &self.pipeline,
            path,
            self.metadata.clone(),
            SerializationFormat::from_path(path),
        )?;
        info!(path = %path.display(), "Model artifact saved");
        Ok(())
    }

    /// Load an artifact written by [`ModelArtifact::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let (pipeline, metadata): (FittedPipeline, ArtifactMetadata) =
            load_model(path, SerializationFormat::from_path(path))?;
        Ok(Self { pipeline, metadata })
    }
}

/// Fit preprocessing and a random forest on `(x, y)`.
///
/// Columns in `categorical` are one-hot encoded, `id_column` is ignored and
/// every other column is numeric.
pub fn fit_model(
    x: &DataFrame,
    y: &Array1<f64>,
    params: &ParameterRecord,
    categorical: &[&str],
    id_column: &str,
) -> Result<ModelArtifact> {
    let start = Instant::now();
    if x.height() != y.len() {
        return Err(SolarError::ShapeError {
            expected: format!("{} targets", x.height()),
            actual: format!("{} targets", y.len()),
        });
    }

    let mut preprocessor = ColumnPreprocessor::new();
    let features = preprocessor.fit_transform(x, categorical, &[id_column])?;

    let mut forest = RandomForest::new(params.n_estimators)
        .with_random_state(params.random_state)
        .with_max_features(params.max_features);
    forest.fit(&features, y)?;

    let in_sample = RegressionMetrics::compute(y, &forest.predict(&features)?);
    let elapsed_secs = start.elapsed().as_secs_f64();

    let input_columns = x
        .get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .filter(|n| n != id_column)
        .collect();
    let metadata = ArtifactMetadata::default()
        .with_input_columns(input_columns)
        .with_features(preprocessor.feature_names())
        .add_hyperparameter("n_estimators", params.n_estimators)
        .add_hyperparameter("random_state", params.random_state)
        .add_hyperparameter("max_features", format!("{:?}", params.max_features))
        .add_metric("train_r2", in_sample.r2)
        .add_metric("train_rmse", in_sample.rmse)
        .add_metric("training_time_secs", elapsed_secs);

    info!(
        rows = x.height(),
        n_features = features.ncols(),
        n_estimators = params.n_estimators,
        train_r2 = in_sample.r2,
        train_rmse = in_sample.rmse,
        elapsed_secs,
        "Random forest fitted"
    );

    Ok(ModelArtifact {
        pipeline: FittedPipeline { preprocessor, forest },
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::MaxFeatures;

    fn train_table() -> DataFrame {
        df!(
            "id" => &[1i64, 2, 3, 4, 5, 6],
            "irradiance" => &[Some(100.0), Some(200.0), None, Some(400.0), Some(500.0), Some(600.0)],
            "error_code" => &[Some("E1"), Some("unknown"), Some("E2"), Some("E1"), None, Some("E2")],
            "efficiency" => &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
        )
        .unwrap()
    }

    #[test]
    fn test_sanitize_replaces_sentinels() {
        let df = train_table();
        let (train, _) = sanitize(&df, &df, &["unknown", "badval", "error"]).unwrap();
        let codes = text_values(&train, "error_code").unwrap();
        assert_eq!(codes[1], None);
        assert_eq!(codes[0].as_deref(), Some("E1"));
    }

    #[test]
    fn test_split_features_target() {
        let (x, y) = split_features_target(&train_table(), "efficiency").unwrap();
        assert!(x.column("efficiency").is_err());
        assert_eq!(y.len(), 6);

        assert!(matches!(
            split_features_target(&x, "efficiency"),
            Err(SolarError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_fit_and_predict() {
        let df = train_table();
        let (x, y) = split_features_target(&df, "efficiency").unwrap();
        let artifact = fit_model(
            &x,
            &y,
            &ParameterRecord::new(5, 42),
            &["error_code"],
            "id",
        )
        .unwrap();

        let preds = artifact.predict(&x).unwrap();
        assert_eq!(preds.len(), 6);
        assert!(preds.iter().all(|p| (0.1..=0.6).contains(p)));
        assert_eq!(artifact.metadata().input_columns, vec!["irradiance", "error_code"]);
        assert!(artifact.metadata().metrics.contains_key("train_r2"));
    }

    #[test]
    fn test_max_features_reaches_the_forest() {
        let df = train_table();
        let (x, y) = split_features_target(&df, "efficiency").unwrap();
        let params = ParameterRecord::new(4, 3).with_max_features(MaxFeatures::Fixed(1));
        let artifact = fit_model(&x, &y, &params, &["error_code"], "id").unwrap();

        assert_eq!(artifact.forest().max_features, MaxFeatures::Fixed(1));
        assert_eq!(
            artifact.metadata().hyperparameters.get("max_features").map(String::as_str),
            Some("Fixed(1)")
        );
    }

    #[test]
    fn test_artifact_round_trip() {
        let df = train_table();
        let (x, y) = split_features_target(&df, "efficiency").unwrap();
        let artifact =
            fit_model(&x, &y, &ParameterRecord::new(4, 1), &["error_code"], "id").unwrap();

        let dir = tempfile::tempdir().unwrap();
        for name in ["model.bin", "model.json"] {
            let path = dir.path().join(name);
            artifact.save(&path).unwrap();
            let loaded = ModelArtifact::load(&path).unwrap();
            assert_eq!(loaded.predict(&x).unwrap(), artifact.predict(&x).unwrap());
        }
    }
}
