//! # virtualeye-monitor
//!
//! The client-side alert notification pipeline.
//!
//! - [`PollingEngine`] - fetches undelivered alerts on a fixed cadence
//! - [`AutoSimulator`] - fabricates tagged test alerts for enabled categories
//! - [`ToastQueue`] - visible notifications with identity-keyed expiry
//! - [`ToggleState`] - optimistic category toggles with revert on failure
//! - [`AlertMonitor`] - the single task that owns and drives all of the above
//!
//! ```no_run
//! use std::sync::Arc;
//! use virtualeye_client::MemoryAlertSource;
//! use virtualeye_core::MonitorConfig;
//! use virtualeye_monitor::AlertMonitor;
//!
//! # async fn demo() {
//! let source = Arc::new(MemoryAlertSource::new());
//! let monitor = AlertMonitor::spawn(source, &MonitorConfig::default());
//! println!("{} toasts", monitor.snapshot().toasts.len());
//! monitor.shutdown().await;
//! # }
//! ```

pub mod error;
pub mod monitor;
pub mod poller;
pub mod simulator;
pub mod toast;
pub mod toggles;

pub use error::{MonitorError, Result};
pub use monitor::{AlertMonitor, MonitorCommand, MonitorHandle, MonitorSnapshot, MonitorStats, Notice};
pub use poller::{PollOutcome, PollingEngine};
pub use simulator::{AutoSimulator, SIMULATED_PREFIX, SimOutcome};
pub use toast::{Removal, ToastEntry, ToastId, ToastQueue};
pub use toggles::{ToggleChange, ToggleState, ToggleStatus};
