//! Command-line interface
//!
//! One subcommand per pipeline stage plus `run` for the whole chain.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

use crate::pipeline::{self, PipelineConfig, StageReport};
use crate::utils::frame::missing_count;
use crate::utils::DataLoader;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}
fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}
fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn rows(count: Option<usize>) -> String {
    count.map_or_else(|| "-".to_string(), |n| n.to_string())
}

fn print_report(report: &StageReport) {
    println!(
        "  {} {:<20} {} {:>7}  {} {:>7}  {}",
        ok("✓"),
        report.stage.to_string(),
        muted("train"),
        rows(report.train_rows),
        muted("test"),
        rows(report.test_rows),
        dim(&format!("{:.1} ms", report.elapsed_ms)),
    );
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "solar-efficiency")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Batch preparation and random-forest training for solar panel efficiency")]
#[command(long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Root directory for stage checkpoints
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stage 1: filter and coerce the raw tables
    Ingest {
        /// Raw training CSV
        #[arg(long)]
        train: Option<PathBuf>,
        /// Raw test CSV
        #[arg(long)]
        test: Option<PathBuf>,
    },
    /// Stage 2: derive corrected voltage and power
    Features,
    /// Stage 3: impute missing values
    Impute,
    /// Stage 4: train and save the model artifact
    Train {
        /// Parameter file with the `model_prediction` section
        #[arg(short, long)]
        params: Option<PathBuf>,
        /// Output artifact path
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
    /// Stage 5: predict and write the submission
    Submit {
        /// Model artifact path
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
    /// Run all five stages in order
    Run {
        /// Parameter file with the `model_prediction` section
        #[arg(short, long)]
        params: Option<PathBuf>,
    },
    /// Show shape and missing counts of a CSV table
    Info {
        /// CSV file
        #[arg(short, long)]
        data: PathBuf,
    },
}

/// Resolve the configuration from `--config` and the global overrides
pub fn load_config(cli: &Cli) -> anyhow::Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_yaml_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config = config.with_data_dir(dir);
    }
    Ok(config)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_ingest(
    config: &PipelineConfig,
    train: Option<PathBuf>,
    test: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut config = config.clone();
    if let Some(train) = train {
        config.raw_train = train;
    }
    if let Some(test) = test {
        config.raw_test = test;
    }
    section("Ingestion");
    print_report(&pipeline::run_ingestion(&config)?);
    Ok(())
}

pub fn cmd_features(config: &PipelineConfig) -> anyhow::Result<()> {
    section("Feature engineering");
    print_report(&pipeline::run_feature_engineering(config)?);
    Ok(())
}

pub fn cmd_impute(config: &PipelineConfig) -> anyhow::Result<()> {
    section("Imputation");
    print_report(&pipeline::run_imputation(config)?);
    Ok(())
}

pub fn cmd_train(
    config: &PipelineConfig,
    params: Option<PathBuf>,
    model: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut config = config.clone();
    if let Some(params) = params {
        config = config.with_params_path(params);
    }
    if let Some(model) = model {
        config = config.with_model_path(model);
    }
    section("Training");
    print_report(&pipeline::run_training(&config)?);
    println!("  {:<16} {}", muted("Model"), config.model_path.display());
    Ok(())
}

pub fn cmd_submit(config: &PipelineConfig, model: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = config.clone();
    if let Some(model) = model {
        config = config.with_model_path(model);
    }
    section("Submission");
    print_report(&pipeline::run_submission(&config)?);
    println!("  {:<16} {}", muted("Output"), config.layout().submission.display());
    Ok(())
}

pub fn cmd_run(config: &PipelineConfig, params: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = config.clone();
    if let Some(params) = params {
        config = config.with_params_path(params);
    }
    section("Pipeline");
    for report in pipeline::run_all(&config)? {
        print_report(&report);
    }
    println!();
    Ok(())
}

pub fn cmd_info(data_path: &PathBuf) -> anyhow::Result<()> {
    section("Data Info");

    let df = DataLoader::new().load_csv(data_path)?;

    println!("  {:<12} {}", muted("File"), data_path.display());
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!();

    println!("  {:<24} {:<12} {:>8}", muted("Column"), muted("Type"), muted("Missing"));
    println!("  {}", dim(&"─".repeat(46)));

    for col in df.get_columns() {
        println!(
            "  {:<24} {:<12} {:>8}",
            col.name().as_str(),
            format!("{:?}", col.dtype()).truecolor(140, 140, 140),
            missing_count(&df, col.name().as_str())?,
        );
    }

    println!();
    Ok(())
}
