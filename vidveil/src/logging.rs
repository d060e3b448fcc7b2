//! Logging bootstrap.
//!
//! Console output plus a non-blocking daily-rotated file, both filtered
//! through `EnvFilter`. Timestamps use the server's local timezone so logs
//! line up with operator clocks.

use std::path::Path;

use chrono::Local;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{Error, Result};

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "vidveil=info,engines_parser=info,tower_http=warn";

/// Custom timer that uses the local timezone via chrono.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Initialize the global subscriber. Returns the appender guard; dropping it
/// flushes and stops the background writer, so `main` holds it for the
/// process lifetime.
pub fn init_logging(log_dir: impl AsRef<Path>) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_from_env("VIDVEIL_LOG")
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let file_appender = tracing_appender::rolling::daily(log_dir.as_ref(), "vidveil.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let stdout_layer = fmt::layer()
        .with_timer(LocalTimer)
        .with_target(true)
        .boxed();

    let file_layer = fmt::layer()
        .with_timer(LocalTimer)
        .with_writer(non_blocking)
        .with_ansi(false)
        .boxed();

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Other(format!("Failed to initialize logging: {e}")))?;

    Ok(guard)
}
