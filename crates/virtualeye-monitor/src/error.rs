//! Error types for the alert monitor.

use thiserror::Error;
use virtualeye_core::AlertType;

/// Alert monitor errors.
///
/// Only foreground operations return these. Background polling and
/// simulation never surface errors.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The monitor has been shut down
    #[error("Alert monitor is not running")]
    Stopped,

    /// A manual test alert was requested for a disabled category
    #[error("{} alerts are disabled", .0.label())]
    CategoryDisabled(AlertType),

    /// A toggle was requested before the server configuration arrived
    #[error("Alert settings are still loading")]
    SettingsNotLoaded,
}

/// Result type for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;
