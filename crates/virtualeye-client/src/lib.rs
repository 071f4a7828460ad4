//! # virtualeye-client
//!
//! Client for the VirtualEye alert service.
//!
//! This crate provides:
//! - [`AlertSource`] - The alert service contract consumed by the monitor
//! - [`HttpAlertSource`] - REST implementation with bearer-token sessions
//! - [`MemoryAlertSource`] - In-process implementation for demos and tests
//! - [`ClientError`] - Error classification (transient, auth, permanent)
//!
//! ## Endpoints
//!
//! | Operation | Request |
//! |-----------|---------|
//! | recent alerts | `GET alerts/recent` |
//! | alert config | `GET alerts/config` / `PUT alerts/config` |
//! | test alert | `POST alerts/trigger` |
//! | history | `GET alerts/history` |
//! | login | `POST auth/login` |
//! | health | `GET health` |

pub mod error;
pub mod http;
pub mod source;
pub mod wire;

// Re-export main types
pub use error::{ClientError, Result};
pub use http::HttpAlertSource;
pub use source::{AlertSource, MemoryAlertSource, Operation};
pub use wire::HealthStatus;
