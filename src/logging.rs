//! Tracing subscriber setup for the launcher binary.
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! binary's job. Every event goes to stdout *and* to a persistent
//! daily-rotated file, with timestamps and severity, filterable via
//! `RUST_LOG`.

use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber: stdout layer plus a non-blocking file
/// appender under `log_dir`.
///
/// Returns the appender guard; dropping it stops the background writer, so
/// the caller must hold it for the life of the process.
pub fn init(log_dir: &Path) -> io::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let appender = tracing_appender::rolling::daily(log_dir, "botvisor.log");
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true);
    let stdout_layer = tracing_subscriber::fmt::layer().with_writer(io::stdout);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(guard)
}
