//! Auto-simulator: periodically asks the alert service to fabricate an alert.
//!
//! Each tick reads the current toggle set. With nothing enabled it does
//! nothing at all; otherwise it picks one enabled category uniformly at
//! random and triggers a tagged test alert. Failures, including a missing
//! session, are logged and dropped.

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, warn};
use virtualeye_client::AlertSource;
use virtualeye_core::{AlertToggleSet, AlertType};

/// Prefix marking fabricated alert messages.
pub const SIMULATED_PREFIX: &str = "[simulated]";

/// Result of one simulator tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimOutcome {
    /// No category enabled
    Skipped,
    /// A test alert of this type was accepted
    Triggered(AlertType),
    /// The trigger request failed
    Failed(AlertType),
}

/// Background generator of synthetic alerts.
pub struct AutoSimulator {
    interval: Duration,
    rng: StdRng,
}

impl AutoSimulator {
    /// Create a simulator firing every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Create a simulator with a deterministic category sequence.
    pub fn with_seed(interval: Duration, seed: u64) -> Self {
        Self {
            interval,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Simulation interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Ticker whose first tick is one full interval from now.
    pub fn ticker(&self) -> Interval {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    /// Choose uniformly among the enabled categories.
    pub fn pick_category(&mut self, toggles: &AlertToggleSet) -> Option<AlertType> {
        toggles.enabled_types().choose(&mut self.rng).copied()
    }

    /// Message sent with a fabricated alert of `alert_type`.
    pub fn synthetic_message(alert_type: AlertType) -> String {
        format!("{SIMULATED_PREFIX} {}", alert_type.default_message())
    }

    /// Send one trigger request. Never returns an error.
    pub async fn trigger(source: Arc<dyn AlertSource>, alert_type: AlertType) -> SimOutcome {
        let message = Self::synthetic_message(alert_type);
        match source.trigger_test_alert(alert_type, &message).await {
            Ok(()) => {
                debug!(%alert_type, "simulated alert triggered");
                SimOutcome::Triggered(alert_type)
            }
            Err(e) => {
                warn!(%alert_type, error = %e, "simulated alert failed");
                SimOutcome::Failed(alert_type)
            }
        }
    }
}
