//! Polling engine: periodic fetch of undelivered alerts.
//!
//! The engine trusts the source's dedup contract and performs no
//! deduplication of its own. A failed fetch is logged and reported as
//! [`PollOutcome::Failed`]; the next regular tick is the only retry.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, warn};
use virtualeye_client::AlertSource;
use virtualeye_core::Alert;

/// Result of one poll tick.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// New alerts, in the order the source returned them
    Delivered(Vec<Alert>),
    /// The fetch succeeded but returned nothing
    Empty,
    /// The fetch failed; the tick is skipped
    Failed(String),
}

impl PollOutcome {
    /// True unless the fetch failed.
    pub fn is_ok(&self) -> bool {
        !matches!(self, PollOutcome::Failed(_))
    }
}

/// Fetches recent alerts from an [`AlertSource`] on a fixed cadence.
#[derive(Clone)]
pub struct PollingEngine {
    source: Arc<dyn AlertSource>,
    interval: Duration,
}

impl PollingEngine {
    /// Create an engine polling `source` every `interval`.
    pub fn new(source: Arc<dyn AlertSource>, interval: Duration) -> Self {
        Self { source, interval }
    }

    /// Poll interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Ticker whose first tick is one full interval from now.
    ///
    /// Late ticks are delayed rather than bursted, so a slow backend never
    /// causes back-to-back fetches.
    pub fn ticker(&self) -> Interval {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    /// Run a single poll. Never returns an error.
    pub async fn poll_once(&self) -> PollOutcome {
        match self.source.fetch_recent_alerts().await {
            Ok(alerts) if alerts.is_empty() => PollOutcome::Empty,
            Ok(alerts) => {
                debug!(count = alerts.len(), source = self.source.name(), "poll delivered alerts");
                PollOutcome::Delivered(alerts)
            }
            Err(e) if e.is_retryable() => {
                debug!(source = self.source.name(), error = %e, "transient poll failure, skipping tick");
                PollOutcome::Failed(e.to_string())
            }
            Err(e) => {
                warn!(source = self.source.name(), error = %e, "poll failed, skipping tick");
                PollOutcome::Failed(e.to_string())
            }
        }
    }
}
