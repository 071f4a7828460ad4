//! Toast lifecycle: the queue of currently visible alert notifications.
//!
//! Every toast gets a [`ToastId`] from a monotonically increasing counter
//! and a fixed deadline. Removal, whether by expiry or dismissal, is keyed
//! by that id, never by position, so entries enqueued in between cannot
//! shift what a pending removal refers to.
//!
//! The queue is a plain data structure with explicit time. The monitor loop
//! drives expiry by sleeping until [`ToastQueue::next_deadline`]; a
//! dismissed entry takes its deadline with it, which is what cancels its
//! timer.
//!
//! At most one toast exists per alert. Alerts are identified by
//! [`AlertKey`]: the server id, else detection time plus position in the
//! delivering batch.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;
use virtualeye_core::{Alert, AlertKey};

/// Client-side identity of a toast. Never reused within a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(u64);

impl ToastId {
    /// Raw sequence number.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A visible notification wrapping one alert.
#[derive(Debug, Clone)]
pub struct ToastEntry {
    /// Toast identity
    pub id: ToastId,
    /// The alert being shown
    pub alert: Alert,
    /// Identity of the alert
    pub key: AlertKey,
    /// When the toast was enqueued
    pub created_at: Instant,
    /// When the toast expires
    pub deadline: Instant,
}

impl ToastEntry {
    /// Lifetime left at `now` (zero once the deadline has passed).
    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }

    /// Fraction of the lifetime still left at `now`, in `0.0..=1.0`.
    pub fn remaining_ratio(&self, now: Instant) -> f64 {
        let total = self.deadline.saturating_duration_since(self.created_at);
        if total.is_zero() {
            return 0.0;
        }
        self.remaining(now).as_secs_f64() / total.as_secs_f64()
    }

    /// True once the deadline has been reached.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

/// Why a toast left the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Its lifetime elapsed
    Expired,
    /// The user dismissed it
    Dismissed,
}

/// Ordered queue of visible toasts, oldest first.
#[derive(Debug)]
pub struct ToastQueue {
    /// Entries by id; id order is insertion order
    entries: BTreeMap<ToastId, ToastEntry>,
    /// Toast currently showing each alert
    live: HashMap<AlertKey, ToastId>,
    /// Next toast id
    next_id: u64,
    /// Visible lifetime assigned to each new entry
    lifetime: Duration,
    /// Count of entries removed by expiry
    expired_count: u64,
    /// Count of entries removed by dismissal
    dismissed_count: u64,
}

impl ToastQueue {
    /// Create an empty queue assigning `lifetime` to every entry.
    pub fn new(lifetime: Duration) -> Self {
        Self {
            entries: BTreeMap::new(),
            live: HashMap::new(),
            next_id: 1,
            lifetime,
            expired_count: 0,
            dismissed_count: 0,
        }
    }

    /// Lifetime assigned to new entries.
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Append each alert as a new toast at the tail of the queue.
    ///
    /// Existing entries are never replaced; an alert that already has a
    /// visible toast is skipped. Returns the new ids in order.
    pub fn enqueue(&mut self, alerts: impl IntoIterator<Item = Alert>, now: Instant) -> Vec<ToastId> {
        let mut ids = Vec::new();
        for (ordinal, alert) in alerts.into_iter().enumerate() {
            let key = alert.key(ordinal);
            if let Some(existing) = self.live.get(&key) {
                debug!(toast_id = existing.value(), ?key, "alert already shown, skipped");
                continue;
            }

            let id = ToastId(self.next_id);
            self.next_id += 1;

            debug!(toast_id = id.value(), alert_type = %alert.alert_type, "toast enqueued");
            self.live.insert(key.clone(), id);
            self.entries.insert(
                id,
                ToastEntry {
                    id,
                    alert,
                    key,
                    created_at: now,
                    deadline: now + self.lifetime,
                },
            );
            ids.push(id);
        }
        ids
    }

    /// Remove an entry whose timer elapsed.
    ///
    /// Returns `None` if the entry is already gone (dismissed or expired).
    pub fn expire(&mut self, id: ToastId) -> Option<ToastEntry> {
        self.remove(id, Removal::Expired)
    }

    /// Remove an entry at the user's request.
    ///
    /// Returns `None` if the entry is already gone. Other entries are never
    /// affected.
    pub fn dismiss(&mut self, id: ToastId) -> Option<ToastEntry> {
        self.remove(id, Removal::Dismissed)
    }

    fn remove(&mut self, id: ToastId, why: Removal) -> Option<ToastEntry> {
        let entry = self.entries.remove(&id)?;
        self.live.remove(&entry.key);
        match why {
            Removal::Expired => self.expired_count += 1,
            Removal::Dismissed => self.dismissed_count += 1,
        }
        debug!(toast_id = id.value(), ?why, "toast removed");
        Some(entry)
    }

    /// Expire every entry whose deadline is at or before `now`.
    pub fn expire_due(&mut self, now: Instant) -> Vec<ToastId> {
        let due: Vec<ToastId> = self
            .entries
            .values()
            .filter(|e| e.is_expired(now))
            .map(|e| e.id)
            .collect();

        for id in &due {
            self.expire(*id);
        }
        due
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.values().map(|e| e.deadline).min()
    }

    /// Look up an entry.
    pub fn get(&self, id: ToastId) -> Option<&ToastEntry> {
        self.entries.get(&id)
    }

    /// Oldest entry, if any.
    pub fn oldest(&self) -> Option<&ToastEntry> {
        self.entries.values().next()
    }

    /// Entries in insertion order (oldest first).
    pub fn iter(&self) -> impl Iterator<Item = &ToastEntry> {
        self.entries.values()
    }

    /// Number of visible entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no entries are visible.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries removed by expiry so far.
    pub fn expired_count(&self) -> u64 {
        self.expired_count
    }

    /// Number of entries removed by dismissal so far.
    pub fn dismissed_count(&self) -> u64 {
        self.dismissed_count
    }
}
