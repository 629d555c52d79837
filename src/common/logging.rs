//! Logging and tracing configuration
//!
//! The harness logs to stdout for interactive runs and, when a log directory
//! is available, also appends to a harness log file so CI can archive the
//! full trace even when the console filter is terse.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Get the log directory for the harness
///
/// - Linux: `~/.local/share/telemetry-harness/logs/`
/// - macOS: `~/Library/Application Support/telemetry-harness/logs/`
pub fn log_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "telemetry-harness")
        .map(|dirs| dirs.data_dir().join("logs"))
}

/// Initialize tracing for the harness (stdout + optional file logging)
///
/// Levels are controlled by `RUST_LOG`; default is INFO for this crate and
/// WARN for dependencies. Returns the appender guard, which must be held for
/// the lifetime of the process so buffered file output is flushed.
pub fn init() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("telemetry_harness=info,warn"));

    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    if let Some(dir) = log_dir() {
        if std::fs::create_dir_all(&dir).is_ok() {
            let appender = tracing_appender::rolling::never(&dir, "harness.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .with(file_layer)
                .init();

            return Some(guard);
        }
    }

    // Fallback: stdout only
    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .init();

    None
}
