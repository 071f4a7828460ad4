//! Terminal UI for VirtualEye.
//!
//! Renders the live alert notifications of a running
//! [`MonitorHandle`](virtualeye_monitor::MonitorHandle) with Ratatui.
//!
//! ## Hotkeys
//!
//! - `a` - Turn alert notifications on/off
//! - `1` `2` `3` - Toggle motion / human / camera-covered alerts
//! - `d` - Dismiss the oldest notification
//! - `t` - Trigger a test alert
//! - `h` - Show/hide alert history
//! - `r` - Reload alert settings
//! - `?` - Help
//! - `q` - Quit

pub mod app;
pub mod event;
pub mod theme;
pub mod view;

pub use app::{App, AppResult, TuiError};
pub use view::ViewState;
