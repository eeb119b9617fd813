//! Logging utilities for the body shop backend.
//!
//! Every crate logs through `tracing`; this module installs the subscriber once
//! at startup. Console output always, plus a daily-rolling file when a log
//! directory is configured.

use bodyshop_config::LoggingConfig;
use std::str::FromStr;
use tracing::{info, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// File name prefix of the rolling log files, e.g. `bodyshop.log.2025-06-02`.
pub const LOG_FILE_PREFIX: &str = "bodyshop.log";

/// Initialize the tracing subscriber with INFO level and console output only.
pub fn init() -> Option<WorkerGuard> {
    init_with_level(Level::INFO, None)
}

/// Initialize logging from the `[logging]` config section.
///
/// An unparsable level falls back to INFO with a warning once logging is up.
pub fn init_from_config(config: &LoggingConfig) -> Option<WorkerGuard> {
    match Level::from_str(&config.level) {
        Ok(level) => init_with_level(level, config.directory.as_deref()),
        Err(_) => {
            let guard = init_with_level(Level::INFO, config.directory.as_deref());
            warn!("Unknown log level '{}', using INFO", config.level);
            guard
        }
    }
}

/// Initialize the tracing subscriber with a specific log level.
///
/// `RUST_LOG` directives are honored; the bodyshop crates and the HTTP trace
/// layer are raised to `level` on top of them. When `directory` is set a
/// non-blocking daily file layer is added and its guard is returned. The caller
/// must keep the guard alive for buffered lines to be flushed.
///
/// Calling this twice is harmless: the second call does not replace the
/// installed subscriber.
pub fn init_with_level(level: Level, directory: Option<&str>) -> Option<WorkerGuard> {
    let mut filter = EnvFilter::from_default_env();
    for target in ["bodyshop", "tower_http"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    let (file_layer, guard) = match directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_thread_names(true),
        )
        .with(file_layer)
        .with(filter)
        .try_init();

    if result.is_ok() {
        info!(log_dir = ?directory, "Logging initialized at level: {}", level);
    }
    guard
}
