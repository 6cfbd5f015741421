//! Solar efficiency pipeline - main entry point

use clap::Parser;
use solar_efficiency::cli::{
    cmd_features, cmd_impute, cmd_info, cmd_ingest, cmd_run, cmd_submit, cmd_train, load_config,
    Cli, Commands,
};
use solar_efficiency::utils::telemetry::init_tracing;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    // Held until exit so the error log is flushed
    let _guard = init_tracing(&config.log_dir, "solar_efficiency.log");

    match cli.command {
        Commands::Ingest { train, test } => cmd_ingest(&config, train, test)?,
        Commands::Features => cmd_features(&config)?,
        Commands::Impute => cmd_impute(&config)?,
        Commands::Train { params, model } => cmd_train(&config, params, model)?,
        Commands::Submit { model } => cmd_submit(&config, model)?,
        Commands::Run { params } => cmd_run(&config, params)?,
        Commands::Info { data } => cmd_info(&data)?,
    }

    Ok(())
}
