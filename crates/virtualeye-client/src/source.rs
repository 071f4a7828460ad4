//! Alert source abstraction and the in-memory implementation.
//!
//! [`AlertSource`] is the seam between the alert pipeline and the remote
//! alert service. Two implementations exist:
//!
//! - [`HttpAlertSource`](crate::http::HttpAlertSource) - the VirtualEye REST API via reqwest
//! - [`MemoryAlertSource`] - an in-process service used by `--demo` and tests
//!
//! ## Dedup contract
//!
//! `fetch_recent_alerts` must only return alerts not previously returned to
//! this client session. Consumers trust this and do no deduplication of
//! their own. `fetch_alert_history` is not subject to the contract.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use ::async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use virtualeye_core::{Alert, AlertSeverity, AlertToggleSet, AlertType};

use crate::error::{ClientError, Result};

/// Remote alert service as seen by the client.
#[async_trait]
pub trait AlertSource: Send + Sync {
    /// Alerts not yet delivered to this session, oldest first.
    async fn fetch_recent_alerts(&self) -> Result<Vec<Alert>>;

    /// Current toggle configuration (source of truth).
    async fn fetch_alert_config(&self) -> Result<AlertToggleSet>;

    /// Persist a toggle configuration. Idempotent.
    async fn update_alert_config(&self, toggles: &AlertToggleSet) -> Result<()>;

    /// Ask the service to synthesize one alert.
    async fn trigger_test_alert(&self, alert_type: AlertType, message: &str) -> Result<()>;

    /// Full alert history, newest first.
    async fn fetch_alert_history(&self) -> Result<Vec<Alert>>;

    /// Source name for logging.
    fn name(&self) -> &str;
}

/// Operations of [`AlertSource`], used to script failures and count calls
/// on [`MemoryAlertSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchRecent,
    FetchConfig,
    UpdateConfig,
    Trigger,
    FetchHistory,
}

#[derive(Debug, Default)]
struct MemoryState {
    pending: Vec<Alert>,
    history: Vec<Alert>,
    toggles: AlertToggleSet,
    next_id: u64,
    authenticated: bool,
    failures: HashMap<Operation, u32>,
    calls: HashMap<Operation, u32>,
    triggered: Vec<(AlertType, String)>,
}

/// In-process alert service.
///
/// Triggered and injected alerts queue up until the next
/// `fetch_recent_alerts`, which drains them, so the dedup contract holds.
/// Every alert is also kept in the history.
#[derive(Debug)]
pub struct MemoryAlertSource {
    state: Mutex<MemoryState>,
    latency: Duration,
}

impl Default for MemoryAlertSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAlertSource {
    /// Create an empty source with every category disabled.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                next_id: 1,
                authenticated: true,
                ..Default::default()
            }),
            latency: Duration::ZERO,
        }
    }

    /// Set the initial toggle configuration.
    pub fn with_toggles(self, toggles: AlertToggleSet) -> Self {
        self.lock().toggles = toggles;
        self
    }

    /// Delay every operation by `latency` (uses tokio time, so paused clocks apply).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queue alerts as if the detection service had produced them.
    pub fn inject(&self, alerts: impl IntoIterator<Item = Alert>) {
        let mut state = self.lock();
        for alert in alerts {
            state.history.insert(0, alert.clone());
            state.pending.push(alert);
        }
    }

    /// Make the next `count` calls of `op` fail with a transient error.
    pub fn fail_next(&self, op: Operation, count: u32) {
        *self.lock().failures.entry(op).or_insert(0) += count;
    }

    /// Simulate a logged-in or logged-out session.
    pub fn set_authenticated(&self, authenticated: bool) {
        self.lock().authenticated = authenticated;
    }

    /// Number of calls made to `op` (including failed ones).
    pub fn calls(&self, op: Operation) -> u32 {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Every successful trigger, in call order.
    pub fn triggered(&self) -> Vec<(AlertType, String)> {
        self.lock().triggered.clone()
    }

    /// Server-side toggle configuration.
    pub fn stored_toggles(&self) -> AlertToggleSet {
        self.lock().toggles
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Count the call and apply scripted failures and auth checks.
    async fn enter(&self, op: Operation) -> Result<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let mut state = self.lock();
        *state.calls.entry(op).or_insert(0) += 1;

        if !state.authenticated {
            return Err(ClientError::Unauthorized("no session".to_string()));
        }
        if let Some(remaining) = state.failures.get_mut(&op)
            && *remaining > 0
        {
            *remaining -= 1;
            debug!(?op, "memory source: scripted failure");
            return Err(ClientError::ApiTransientError(format!("scripted failure for {op:?}")));
        }
        Ok(())
    }
}

fn severity_for(alert_type: AlertType) -> AlertSeverity {
    match alert_type {
        AlertType::Human => AlertSeverity::High,
        AlertType::CameraCovered => AlertSeverity::Medium,
        AlertType::Motion => AlertSeverity::Low,
    }
}

#[async_trait]
impl AlertSource for MemoryAlertSource {
    async fn fetch_recent_alerts(&self) -> Result<Vec<Alert>> {
        self.enter(Operation::FetchRecent).await?;
        Ok(std::mem::take(&mut self.lock().pending))
    }

    async fn fetch_alert_config(&self) -> Result<AlertToggleSet> {
        self.enter(Operation::FetchConfig).await?;
        Ok(self.lock().toggles)
    }

    async fn update_alert_config(&self, toggles: &AlertToggleSet) -> Result<()> {
        self.enter(Operation::UpdateConfig).await?;
        self.lock().toggles = *toggles;
        Ok(())
    }

    async fn trigger_test_alert(&self, alert_type: AlertType, message: &str) -> Result<()> {
        self.enter(Operation::Trigger).await?;

        let mut state = self.lock();
        let id = format!("mem-{}", state.next_id);
        state.next_id += 1;

        let alert = Alert::new(alert_type, message)
            .with_id(id)
            .with_timestamp(Utc::now())
            .with_severity(severity_for(alert_type))
            .simulated();

        state.triggered.push((alert_type, message.to_string()));
        state.history.insert(0, alert.clone());
        state.pending.push(alert);
        Ok(())
    }

    async fn fetch_alert_history(&self) -> Result<Vec<Alert>> {
        self.enter(Operation::FetchHistory).await?;
        Ok(self.lock().history.clone())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
