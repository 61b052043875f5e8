//! Tracing subscriber setup for the binary.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::{LogFormat, LoggingSection};

const LOG_FILE_PREFIX: &str = "dealboard.log";

/// Keeps the file writer flushing until dropped.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Directive used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "dealboard=debug" } else { "dealboard=info" }
}

fn build_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

fn stderr_layer(format: LogFormat) -> Box<dyn Layer<Registry> + Send + Sync> {
    match format {
        LogFormat::Fmt => Box::new(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        ),
        LogFormat::Json => Box::new(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true),
        ),
    }
}

fn file_layer(dir: &Path, format: LogFormat) -> Result<(Box<dyn Layer<Registry> + Send + Sync>, WorkerGuard)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer: Box<dyn Layer<Registry> + Send + Sync> = match format {
        LogFormat::Fmt => Box::new(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer)),
        LogFormat::Json => Box::new(tracing_subscriber::fmt::layer().json().with_writer(writer)),
    };
    Ok((layer, guard))
}

/// Install the global subscriber. Events go to stderr, and also to a daily
/// file when `log_dir` is configured.
pub fn init(logging: &LoggingSection, verbose: bool) -> Result<LogGuard> {
    let mut layers = vec![stderr_layer(logging.format)];
    let mut file_guard = None;
    if let Some(dir) = &logging.log_dir {
        let (layer, guard) = file_layer(dir, logging.format)?;
        layers.push(layer);
        file_guard = Some(guard);
    }
    layers.push(Box::new(build_filter(verbose)));

    Registry::default()
        .with(layers)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(LogGuard { _file: file_guard })
}
