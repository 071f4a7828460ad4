//! Alert toggle state with optimistic updates.
//!
//! The remote config service owns which categories are enabled. This module
//! keeps two copies: `committed`, the last set the server acknowledged, and
//! `local`, what the UI shows. A toggle changes `local` immediately and
//! starts a persist; a failed persist snaps `local` back to `committed`.
//!
//! Persists are serialized. While one is in flight, further toggles only
//! update `local`; when the in-flight request succeeds and `local` has moved
//! on, the newer set is sent next. Two PUTs are never in flight at once, so
//! a late failure can never revert a newer value that the server has
//! already accepted.
//!
//! Nothing can be toggled before the first load: every PUT carries the whole
//! set, so editing the all-disabled placeholder would overwrite categories
//! the user never touched.
//!
//! ```text
//! Idle ──set──▶ Pending ──ok──▶ Committed
//!                  │  ▲
//!                  │  └─ok, local changed meanwhile (send again)
//!                  └─err─▶ RevertedOnError
//! ```

use tracing::debug;
use virtualeye_core::{AlertToggleSet, AlertType};

/// Where the toggle state is in its persist cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToggleStatus {
    /// No change requested since load
    #[default]
    Idle,
    /// A persist is in flight
    Pending,
    /// The last persist was acknowledged
    Committed,
    /// The last persist failed and local state was reverted
    RevertedOnError,
}

impl ToggleStatus {
    /// Short marker for display.
    pub fn marker(&self) -> &'static str {
        match self {
            ToggleStatus::Idle | ToggleStatus::Committed => "",
            ToggleStatus::Pending => "…",
            ToggleStatus::RevertedOnError => "↺",
        }
    }
}

/// Outcome of a local toggle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleChange {
    /// Applied locally; send this set now
    Persist(AlertToggleSet),
    /// Applied locally; sent once the in-flight persist completes
    Queued,
    /// Already in the requested state
    Unchanged,
    /// Refused: the server configuration has not been loaded yet
    NotLoaded,
}

/// Cached toggle configuration with optimistic local edits.
#[derive(Debug, Clone, Default)]
pub struct ToggleState {
    local: AlertToggleSet,
    committed: AlertToggleSet,
    in_flight: Option<AlertToggleSet>,
    status: ToggleStatus,
    loaded: bool,
}

impl ToggleState {
    /// What the UI shows (includes unacknowledged edits).
    pub fn local(&self) -> AlertToggleSet {
        self.local
    }

    /// Last server-acknowledged configuration.
    pub fn committed(&self) -> AlertToggleSet {
        self.committed
    }

    /// Current status.
    pub fn status(&self) -> ToggleStatus {
        self.status
    }

    /// True if a persist request is in flight.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// True once a configuration has been loaded from the server.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Apply a configuration fetched from the server.
    ///
    /// Ignored while a persist is in flight: that request's outcome decides
    /// what is committed. Returns true if the state was replaced.
    pub fn apply_loaded(&mut self, toggles: AlertToggleSet) -> bool {
        if self.in_flight.is_some() {
            debug!("toggle config load ignored, persist in flight");
            return false;
        }
        self.local = toggles;
        self.committed = toggles;
        self.loaded = true;
        true
    }

    /// Change one category locally.
    pub fn set(&mut self, alert_type: AlertType, enabled: bool) -> ToggleChange {
        if !self.loaded {
            return ToggleChange::NotLoaded;
        }
        if self.local.get(alert_type) == enabled && self.in_flight.is_none() {
            return ToggleChange::Unchanged;
        }

        self.local.set(alert_type, enabled);
        self.status = ToggleStatus::Pending;

        if self.in_flight.is_some() {
            return ToggleChange::Queued;
        }
        self.in_flight = Some(self.local);
        ToggleChange::Persist(self.local)
    }

    /// The in-flight persist succeeded.
    ///
    /// Returns the next set to persist if `local` changed meanwhile.
    pub fn on_persist_ok(&mut self) -> Option<AlertToggleSet> {
        let sent = self.in_flight.take()?;
        self.committed = sent;

        if self.local != sent {
            self.in_flight = Some(self.local);
            self.status = ToggleStatus::Pending;
            return Some(self.local);
        }

        self.status = ToggleStatus::Committed;
        None
    }

    /// The in-flight persist failed: revert to the last committed set.
    pub fn on_persist_err(&mut self) {
        if self.in_flight.take().is_none() {
            return;
        }
        self.local = self.committed;
        self.status = ToggleStatus::RevertedOnError;
    }
}
