use std::result::Result;

use snafu::ResultExt;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{registry, EnvFilter};

use crate::config::Config;
use crate::error::{ApplicationError, InitializeLoggerSnafu, LogDirectorySnafu};

const DEFAULT_FILTER: &str = "info,tower_http=debug";

/// Logs pretty events to stdout and JSON events to a daily rolling file.
///
/// The returned guard flushes the file writer when dropped, keep it alive for the whole process.
pub fn init(config: &Config) -> Result<WorkerGuard, ApplicationError> {
    std::fs::create_dir_all(&config.log_dir).context(LogDirectorySnafu)?;

    let (file_layer, guard) = {
        let file_appender = tracing_appender::rolling::daily(&config.log_dir, "posts-statistics.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let layer = layer().with_ansi(false).json().with_writer(non_blocking);

        (layer, guard)
    };

    let console_layer = layer().pretty().with_writer(std::io::stdout);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber).context(InitializeLoggerSnafu)?;

    Ok(guard)
}
