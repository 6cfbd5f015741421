//! Stage runners: read the predecessor's checkpoint, transform, write our own

use super::config::{PipelineConfig, SubmissionInput};
use super::{feature_engineering, ingestion, missing_values, model_training, submission};
use crate::error::Result;
use crate::training::load_parameters;
use crate::utils::{DataLoader, DataSaver, Timer};
use polars::prelude::*;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{error, info, warn};

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Ingestion,
    FeatureEngineering,
    Imputation,
    Training,
    Submission,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Ingestion => "ingestion",
            Stage::FeatureEngineering => "feature_engineering",
            Stage::Imputation => "imputation",
            Stage::Training => "training",
            Stage::Submission => "submission",
        };
        f.write_str(name)
    }
}

/// What a stage produced.
///
/// Row counts are `None` for a table the stage did not process; the
/// submission stage only fills the count of the table it scored.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub train_rows: Option<usize>,
    pub test_rows: Option<usize>,
    pub elapsed_ms: f64,
}

/// Log a stage failure once before handing it to the caller
fn logged<T>(stage: Stage, result: Result<T>) -> Result<T> {
    result.map_err(|e| {
        error!(%stage, error = %e, "Stage failed");
        e
    })
}

fn as_strs(items: &[String]) -> Vec<&str> {
    items.iter().map(String::as_str).collect()
}

fn load_pair(train: &Path, test: &Path) -> Result<(DataFrame, DataFrame)> {
    let loader = DataLoader::new();
    Ok((loader.load_csv(train)?, loader.load_csv(test)?))
}

fn save_pair(train: &mut DataFrame, test: &mut DataFrame, train_path: &Path, test_path: &Path) -> Result<()> {
    DataSaver::save_csv(train, train_path)?;
    DataSaver::save_csv(test, test_path)?;
    info!(train = %train_path.display(), test = %test_path.display(), "Checkpoint saved");
    Ok(())
}

fn report(
    stage: Stage,
    train_rows: Option<usize>,
    test_rows: Option<usize>,
    timer: &Timer,
) -> StageReport {
    let report = StageReport {
        stage,
        train_rows,
        test_rows,
        elapsed_ms: timer.elapsed_ms(),
    };
    info!(
        %stage,
        train_rows,
        test_rows,
        elapsed_ms = report.elapsed_ms,
        "Stage complete"
    );
    report
}

/// Stage 1: raw tables -> positive-irradiance rows with numeric coercion
pub fn run_ingestion(config: &PipelineConfig) -> Result<StageReport> {
    logged(Stage::Ingestion, ingest(config))
}

fn ingest(config: &PipelineConfig) -> Result<StageReport> {
    let timer = Timer::start();
    let layout = config.layout();

    let (train, test) = load_pair(&config.raw_train, &config.raw_test)?;
    info!(train_rows = train.height(), test_rows = test.height(), "Raw tables loaded");

    let (train, test) = ingestion::filter_positive_irradiance(&train, &test)?;
    let (mut train, mut test) =
        ingestion::coerce_numeric(&train, &test, &as_strs(&config.numeric_coercion_columns))?;

    save_pair(&mut train, &mut test, &layout.ingested_train, &layout.ingested_test)?;
    Ok(report(Stage::Ingestion, Some(train.height()), Some(test.height()), &timer))
}

/// Stage 2: corrected voltage, row cleanup and clipped power
pub fn run_feature_engineering(config: &PipelineConfig) -> Result<StageReport> {
    logged(Stage::FeatureEngineering, engineer(config))
}

fn engineer(config: &PipelineConfig) -> Result<StageReport> {
    let timer = Timer::start();
    let layout = config.layout();

    let (train, test) = load_pair(&layout.ingested_train, &layout.ingested_test)?;
    let (train, test) =
        feature_engineering::derive_corrected_voltage(&train, &test, &config.target_column)?;
    let (mut train, mut test, _) =
        feature_engineering::derive_power_and_clip(&train, &test, &config.power_source_column)?;

    save_pair(&mut train, &mut test, &layout.featured_train, &layout.featured_test)?;
    Ok(report(Stage::FeatureEngineering, Some(train.height()), Some(test.height()), &timer))
}

/// Stage 3: drop the unreliable column, KNN-impute, mode-fill categoricals
pub fn run_imputation(config: &PipelineConfig) -> Result<StageReport> {
    logged(Stage::Imputation, impute(config))
}

fn impute(config: &PipelineConfig) -> Result<StageReport> {
    let timer = Timer::start();
    let layout = config.layout();
    let knn = config.knn_imputer();

    let (train, test) = load_pair(&layout.featured_train, &layout.featured_test)?;
    let (train, test) = missing_values::drop_unreliable_column(&train, &test, &config.unreliable_column)?;
    let (train, test) =
        missing_values::impute_single_column(&train, &test, &config.single_impute_column, &knn)?;
    let (train, test) = missing_values::impute_feature_block(
        &train,
        &test,
        &as_strs(&config.knn_feature_columns),
        &knn,
    )?;
    let (mut train, mut test) =
        missing_values::fill_categorical_mode(&train, &test, &as_strs(&config.mode_fill_columns))?;

    for (table, df) in [("train", &train), ("test", &test)] {
        let remaining: Vec<(String, usize)> = missing_values::missing_summary(df)?
            .into_iter()
            .filter(|(_, n)| *n > 0)
            .collect();
        if remaining.is_empty() {
            info!(table, "No missing values remain");
        } else {
            warn!(table, ?remaining, "Missing values remain after imputation");
        }
    }

    save_pair(&mut train, &mut test, &layout.imputed_train, &layout.imputed_test)?;
    Ok(report(Stage::Imputation, Some(train.height()), Some(test.height()), &timer))
}

/// Stage 4: fit and persist the model artifact
pub fn run_training(config: &PipelineConfig) -> Result<StageReport> {
    logged(Stage::Training, train_model(config))
}

fn train_model(config: &PipelineConfig) -> Result<StageReport> {
    let timer = Timer::start();
    let layout = config.layout();

    let params = load_parameters(&config.params_path)?;
    let (train, test) = load_pair(&layout.imputed_train, &layout.imputed_test)?;
    let sentinels = as_strs(&config.sentinel_values);
    let (train, test) = model_training::sanitize(&train, &test, &sentinels)?;

    let (x, y) = model_training::split_features_target(&train, &config.target_column)?;
    let artifact = model_training::fit_model(
        &x,
        &y,
        &params,
        &as_strs(&config.categorical_columns),
        &config.id_column,
    )?
    .with_target(&config.target_column);
    artifact.save(&config.model_path)?;

    Ok(report(Stage::Training, Some(train.height()), Some(test.height()), &timer))
}

/// Stage 5: score the configured table and write the submission
pub fn run_submission(config: &PipelineConfig) -> Result<StageReport> {
    logged(Stage::Submission, submit(config))
}

fn submit(config: &PipelineConfig) -> Result<StageReport> {
    let timer = Timer::start();
    let layout = config.layout();

    let artifact = model_training::ModelArtifact::load(&config.model_path)?;
    let source = match config.submission_input {
        SubmissionInput::ImputedTest => &layout.imputed_test,
        SubmissionInput::ImputedTrain => &layout.imputed_train,
    };
    let table = DataLoader::new().load_csv(source)?;
    let table = model_training::sanitize_table(&table, &as_strs(&config.sentinel_values))?;

    let (ids, predictions) = submission::predict(&artifact, &table, &config.id_column)?;
    let mut out = submission::build_submission(&ids, &predictions, &config.target_column)?;
    submission::save_submission(&mut out, &layout.submission)?;

    let (train_rows, test_rows) = match config.submission_input {
        SubmissionInput::ImputedTest => (None, Some(out.height())),
        SubmissionInput::ImputedTrain => (Some(out.height()), None),
    };
    Ok(report(Stage::Submission, train_rows, test_rows, &timer))
}

/// Run all five stages in order, stopping at the first failure
pub fn run_all(config: &PipelineConfig) -> Result<Vec<StageReport>> {
    let runners: [fn(&PipelineConfig) -> Result<StageReport>; 5] = [
        run_ingestion,
        run_feature_engineering,
        run_imputation,
        run_training,
        run_submission,
    ];

    let mut reports = Vec::with_capacity(runners.len());
    for run in runners {
        reports.push(run(config)?);
    }
    Ok(reports)
}
