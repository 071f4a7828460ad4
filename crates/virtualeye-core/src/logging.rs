//! Logging infrastructure for VirtualEye.
//!
//! Structured logging using the `tracing` ecosystem:
//!
//! - JSON lines written to `~/.virtualeye/logs/virtualeye.log` (daily rolling)
//! - Optional console output to stderr. The terminal UI turns this off
//!   because stderr output would tear the alternate screen.
//! - `-v` raises the default level to DEBUG; `RUST_LOG` overrides both.
//!
//! ## Example
//!
//! ```no_run
//! use virtualeye_core::logging;
//!
//! let _guard = logging::init_logging(None, false, true).expect("logging init");
//!
//! tracing::info!("VirtualEye started");
//! tracing::debug!(alert_type = "motion", "simulated alert triggered");
//! ```

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{EyeError, Result};

/// Log file name inside the log directory.
pub const LOG_FILE_NAME: &str = "virtualeye.log";

/// Guard that must be held to ensure log flushing on shutdown.
///
/// Keep this guard alive for the lifetime of the application.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the VirtualEye logging system.
///
/// # Arguments
///
/// * `log_dir` - Optional custom log directory. Defaults to `~/.virtualeye/logs/`
/// * `verbose` - If true, sets log level to DEBUG. Otherwise uses INFO.
/// * `console` - If true, also logs human-readable lines to stderr.
///
/// # Returns
///
/// A [`LogGuard`] that must be held for the application lifetime.
pub fn init_logging(log_dir: Option<PathBuf>, verbose: bool, console: bool) -> Result<LogGuard> {
    let log_dir = match log_dir {
        Some(dir) => dir,
        None => default_log_dir()?,
    };

    std::fs::create_dir_all(&log_dir).map_err(|e| EyeError::DirectoryCreation {
        path: log_dir.clone(),
        source: e,
    })?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_NAME);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    // JSON layer for file output
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_current_span(true)
        .with_span_list(true);

    // Human-readable layer for console output
    let console_layer = console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(verbose)
            .with_line_number(verbose)
            .compact()
            .boxed()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| EyeError::internal(format!("logging already initialized: {e}")))?;

    tracing::debug!(log_dir = %log_dir.display(), verbose, console, "logging initialized");

    Ok(LogGuard {
        _file_guard: Some(file_guard),
    })
}

/// Initialize minimal console-only logging for testing.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Filter directive used when `RUST_LOG` is not set.
///
/// Every workspace crate is named `virtualeye*`, so the single prefix covers
/// all of them.
pub fn default_directive(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("virtualeye={level}")
}

/// Get the VirtualEye home directory (`~/.virtualeye`).
pub fn virtualeye_home() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| EyeError::Internal {
        message: "home directory could not be determined".into(),
    })?;

    Ok(home.join(".virtualeye"))
}

/// Get the default log directory path.
///
/// Returns `~/.virtualeye/logs/`
pub fn default_log_dir() -> Result<PathBuf> {
    Ok(virtualeye_home()?.join("logs"))
}

/// Get the default log file path.
///
/// Returns `~/.virtualeye/logs/virtualeye.log`
pub fn default_log_file() -> Result<PathBuf> {
    Ok(default_log_dir()?.join(LOG_FILE_NAME))
}
