//! Stage 5: score a feature table and write the (id, prediction) table

use super::model_training::ModelArtifact;
use crate::error::{Result, SolarError};
use crate::utils::DataSaver;
use ndarray::Array1;
use polars::prelude::*;
use std::path::Path;
use tracing::info;

/// Split off the identifier column and predict the remaining features.
///
/// Returns the identifier column and one prediction per row, in row order.
pub fn predict(
    artifact: &ModelArtifact,
    table: &DataFrame,
    id_column: &str,
) -> Result<(Column, Array1<f64>)> {
    let ids = table.column(id_column)?.clone();
    let features = table.drop(id_column)?;
    let predictions = artifact.predict(&features)?;
    Ok((ids, predictions))
}

/// Zip identifiers with predictions into a two-column table
pub fn build_submission(ids: &Column, predictions: &Array1<f64>, target: &str) -> Result<DataFrame> {
    if ids.len() != predictions.len() {
        return Err(SolarError::ShapeError {
            expected: format!("{} predictions", ids.len()),
            actual: format!("{} predictions", predictions.len()),
        });
    }
    let values = Column::new(target.into(), predictions.to_vec());
    Ok(DataFrame::new(vec![ids.clone(), values])?)
}

/// Write the submission table, creating parent directories as needed
pub fn save_submission(submission: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    DataSaver::save_csv(submission, path)?;
    info!(path = %path.display(), rows = submission.height(), "Submission saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_submission_keeps_order() {
        let ids = Column::new("id".into(), &[30i64, 10, 20]);
        let preds = Array1::from_vec(vec![0.3, 0.1, 0.2]);
        let submission = build_submission(&ids, &preds, "efficiency").unwrap();

        assert_eq!(submission.shape(), (3, 2));
        assert_eq!(submission.get_column_names()[1].as_str(), "efficiency");
        let out: Vec<Option<i64>> = submission.column("id").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(out, vec![Some(30), Some(10), Some(20)]);
    }

    #[test]
    fn test_length_mismatch() {
        let ids = Column::new("id".into(), &[1i64, 2]);
        let preds = Array1::from_vec(vec![0.5]);
        assert!(matches!(
            build_submission(&ids, &preds, "efficiency"),
            Err(SolarError::ShapeError { .. })
        ));
    }
}
