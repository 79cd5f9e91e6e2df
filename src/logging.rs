//! Logging configuration for docqa

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::{
    self,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::config::LoggingConfig;
use crate::Result;

/// Initialize logging from configuration
///
/// Console output always goes to stderr so answers printed on stdout stay clean.
/// When `file_output` is enabled a daily rolling file is written under
/// `directory`; the returned guard must be kept alive to flush it.
///
/// # Errors
/// - Log directory cannot be created
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,docqa={}", config.level)));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);

    if !config.file_output {
        Registry::default()
            .with(env_filter)
            .with(console_layer)
            .init();
        tracing::debug!("Logging initialized with level: {}", config.level);
        return Ok(None);
    }

    let logs_dir = Path::new(&config.directory);
    if !logs_dir.exists() {
        std::fs::create_dir_all(logs_dir)?;
    }

    let file_appender = tracing_appender::rolling::daily(logs_dir, "docqa.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(non_blocking)
        .with_ansi(false); // No colors in file

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::debug!(
        "Logging initialized with level: {} - log files under {}/docqa.log.YYYY-MM-DD",
        config.level,
        config.directory
    );

    Ok(Some(guard))
}

/// Initialize simple logging for testing
pub fn init_simple_logging() {
    let _ = tracing_subscriber::fmt()
        .with_target(true)
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
