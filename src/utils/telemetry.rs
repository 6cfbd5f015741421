//! Process-wide diagnostics setup
//!
//! Installed once by the binary; stages only emit `tracing` events.

use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_FILTER: &str = "solar_efficiency=info";

/// Install the global subscriber: console output filtered by `RUST_LOG`
/// (default `solar_efficiency=info`) plus an error-only log file under `log_dir`.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the process.
pub fn init_tracing(log_dir: &Path, file_name: &str) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_filter(console_filter))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer)
                .with_filter(LevelFilter::ERROR),
        )
        .init();

    guard
}
