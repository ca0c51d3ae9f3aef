//! Tracing setup for hosts embedding the core.
//!
//! Use the `RUST_LOG` env var to control the log level (e.g. `RUST_LOG=debug`);
//! the directive passed in is used when it is unset.

use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_PREFIX: &str = "dayplan.log";

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Log to stderr. Safe to call more than once; later calls are ignored.
pub fn init_tracing(default_directive: &str) {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter(default_directive))
        .try_init();
}

/// Log to stderr and to a daily rolling file in `log_dir`.
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// lifetime of the process.
pub fn init_tracing_to_dir(log_dir: &Path, default_directive: &str) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .with(env_filter(default_directive))
        .try_init()?;
    Ok(guard)
}
