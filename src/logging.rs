//! Tracing subscriber setup for the binary

use std::fs;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogConfig, log_path};

/// Installs the global subscriber.
///
/// Console output goes to stderr. When file logging is enabled the returned
/// guard must be held until exit so buffered lines are flushed.
pub fn init(config: &LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.filter))?;

    let console = if config.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };

    let (file, guard) = if config.file {
        let path = log_path();
        let directory = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| ".".into());
        fs::create_dir_all(&directory)?;

        let file_name = path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "nuget-tools.log".into());
        let appender = tracing_appender::rolling::never(directory, file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let layer = fmt::layer().json().with_ansi(false).with_writer(writer).boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()?;

    Ok(guard)
}
