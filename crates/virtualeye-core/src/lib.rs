//! # virtualeye-core
//!
//! Core types, errors, and utilities for the VirtualEye dashboard.
//!
//! This crate provides:
//! - [`EyeError`] - Error type for configuration, I/O and logging setup
//! - [`logging`] - Tracing setup and log management utilities
//! - [`types`] - Alert domain types shared by the client, monitor and TUI
//! - [`config`] - YAML configuration (`~/.virtualeye/config.yaml`)
//!
//! ## Example
//!
//! ```no_run
//! use virtualeye_core::{Config, logging};
//!
//! fn main() -> virtualeye_core::Result<()> {
//!     let _guard = logging::init_logging(None, false, true)?;
//!
//!     let config = Config::load(None)?;
//!     tracing::info!(base_url = %config.api.base_url, "configuration loaded");
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

// Re-export main types for convenience
pub use config::{ApiConfig, Config, MonitorConfig, SimulatorConfig};
pub use error::{EyeError, Result};
pub use logging::{LogGuard, init_logging};
pub use types::{Alert, AlertKey, AlertSeverity, AlertToggleSet, AlertType};
