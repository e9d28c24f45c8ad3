//! Tracing setup for the command line
//!
//! - Human-readable events on stderr (stdout carries command output)
//! - Optional JSON log file through a non-blocking writer

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_FILTER: &str = "stretch=info,stretch_rs=info,stretch_core=info";

/// Installs the global subscriber.
///
/// Returns the file writer's guard when `log_file` is set; it must be kept
/// alive until exit so buffered lines are flushed.
pub fn init_telemetry(log_file: Option<&Path>, verbose: bool) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("stretch=debug,stretch_rs=debug,stretch_core=debug")
        } else {
            EnvFilter::new(DEFAULT_FILTER)
        }
    });

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let file_name = path
                .file_name()
                .context("log file path has no file name")?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_current_span(true)
                .with_target(true)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    if let Some(path) = log_file {
        tracing::debug!("Logging to {}", path.display());
    }

    Ok(guard)
}
