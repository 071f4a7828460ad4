//! The alert monitor: one task owning the whole notification pipeline.
//!
//! [`AlertMonitor::spawn`] starts a single tokio task that exclusively owns
//! the toast queue, the toggle state and the simulator. It multiplexes:
//!
//! - the poll ticker
//! - the simulator ticker (only when enabled)
//! - the earliest toast deadline
//! - completions of in-flight network requests (a [`JoinSet`])
//! - commands from the [`MonitorHandle`]
//!
//! Network requests run as spawned tasks and report back as messages, so
//! every state change happens inside the loop. After each change the loop
//! publishes a fresh [`MonitorSnapshot`] on a `watch` channel.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::{self, JoinHandle, JoinSet};
use tokio::time::{Instant, Interval};
use tracing::{debug, info, warn};
use virtualeye_client::{AlertSource, ClientError};
use virtualeye_core::{Alert, AlertToggleSet, AlertType, MonitorConfig};

use crate::error::{MonitorError, Result};
use crate::poller::{PollOutcome, PollingEngine};
use crate::simulator::{AutoSimulator, SimOutcome};
use crate::toast::{ToastEntry, ToastId, ToastQueue};
use crate::toggles::{ToggleChange, ToggleState, ToggleStatus};

/// One-line error shown inline after a failed foreground action.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
    pub raised_at: Instant,
}

/// Pipeline counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub polls_ok: u64,
    pub polls_failed: u64,
    /// Poll ticks skipped because the display was off or a poll was in flight
    pub polls_skipped: u64,
    pub alerts_received: u64,
    pub simulated: u64,
    pub simulate_failed: u64,
    pub toasts_expired: u64,
    pub toasts_dismissed: u64,
}

/// Published view of the monitor state.
#[derive(Debug, Clone, Default)]
pub struct MonitorSnapshot {
    /// Visible toasts, oldest first
    pub toasts: Vec<ToastEntry>,
    /// Toggle set as shown (includes unacknowledged edits)
    pub toggles: AlertToggleSet,
    pub toggle_status: ToggleStatus,
    /// True once the toggle configuration has been loaded
    pub toggles_loaded: bool,
    /// The on/off control
    pub display_enabled: bool,
    pub simulator_enabled: bool,
    /// Alert history, once requested
    pub history: Option<Vec<Alert>>,
    pub notice: Option<Notice>,
    pub stats: MonitorStats,
}

impl MonitorSnapshot {
    /// Toasts to render: none while the display is off.
    pub fn visible_toasts(&self) -> &[ToastEntry] {
        if self.display_enabled { &self.toasts[..] } else { &[] }
    }

    /// Oldest visible toast.
    pub fn oldest_toast(&self) -> Option<&ToastEntry> {
        self.visible_toasts().first()
    }
}

/// Requests from the handle to the loop.
#[derive(Debug)]
pub enum MonitorCommand {
    Dismiss(ToastId),
    SetToggle(AlertType, bool),
    SetDisplayEnabled(bool),
    TriggerTest(AlertType),
    RefreshHistory,
    ReloadConfig,
    Shutdown,
}

/// Completion of a spawned network request.
enum TaskResult {
    Polled(PollOutcome),
    Simulated(SimOutcome),
    Loaded(std::result::Result<AlertToggleSet, ClientError>),
    Persisted(std::result::Result<(), ClientError>),
    Triggered(AlertType, std::result::Result<(), ClientError>),
    History(std::result::Result<Vec<Alert>, ClientError>),
}

/// Entry point for starting the pipeline.
pub struct AlertMonitor;

impl AlertMonitor {
    /// Start the monitor task on the current tokio runtime.
    ///
    /// The toggle configuration is loaded immediately; until it arrives the
    /// toggle set is all-disabled, so the simulator stays idle.
    pub fn spawn(source: Arc<dyn AlertSource>, config: &MonitorConfig) -> MonitorHandle {
        let simulator = config
            .simulator
            .enabled
            .then(|| AutoSimulator::new(config.simulator.interval()));
        Self::spawn_with(source, config, simulator)
    }

    /// Start the monitor with an explicit simulator (e.g. a seeded one).
    pub fn spawn_with(
        source: Arc<dyn AlertSource>,
        config: &MonitorConfig,
        simulator: Option<AutoSimulator>,
    ) -> MonitorHandle {
        let toggles = ToggleState::default();
        let initial = MonitorSnapshot {
            toasts: Vec::new(),
            toggles: toggles.local(),
            toggle_status: toggles.status(),
            toggles_loaded: false,
            display_enabled: config.display_enabled,
            simulator_enabled: simulator.is_some(),
            history: None,
            notice: None,
            stats: MonitorStats::default(),
        };
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        info!(
            source = source.name(),
            poll_ms = config.poll_interval_ms,
            toast_ms = config.toast_lifetime_ms,
            simulator = simulator.is_some(),
            "starting alert monitor"
        );

        let state = MonitorLoop {
            poller: PollingEngine::new(source.clone(), config.poll_interval()),
            source,
            simulator,
            queue: ToastQueue::new(config.toast_lifetime()),
            toggles,
            display_enabled: config.display_enabled,
            history: None,
            notice: None,
            stats: MonitorStats::default(),
            poll_task: None,
            tasks: JoinSet::new(),
            snapshot_tx,
        };
        let task = tokio::spawn(state.run(command_rx));

        MonitorHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            task: Some(task),
        }
    }
}

/// Handle to a running monitor.
///
/// Command methods are synchronous so they can be called from a UI thread.
/// [`shutdown`](Self::shutdown) consumes the handle; dropping the handle
/// without it aborts the monitor task.
pub struct MonitorHandle {
    commands: mpsc::UnboundedSender<MonitorCommand>,
    snapshots: watch::Receiver<MonitorSnapshot>,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    fn send(&self, command: MonitorCommand) -> Result<()> {
        self.commands.send(command).map_err(|_| MonitorError::Stopped)
    }

    /// Dismiss a toast. Unknown or already-removed ids are ignored.
    pub fn dismiss(&self, id: ToastId) -> Result<()> {
        self.send(MonitorCommand::Dismiss(id))
    }

    /// Change one category. Visible in the next snapshot, before the server
    /// acknowledges it.
    ///
    /// Rejected until the server configuration has been loaded.
    pub fn set_toggle(&self, alert_type: AlertType, enabled: bool) -> Result<()> {
        if !self.snapshots.borrow().toggles_loaded {
            return Err(MonitorError::SettingsNotLoaded);
        }
        self.send(MonitorCommand::SetToggle(alert_type, enabled))
    }

    /// Flip one category relative to the current snapshot.
    pub fn toggle(&self, alert_type: AlertType) -> Result<()> {
        let enabled = self.snapshots.borrow().toggles.get(alert_type);
        self.set_toggle(alert_type, !enabled)
    }

    /// The on/off control.
    pub fn set_display_enabled(&self, enabled: bool) -> Result<()> {
        self.send(MonitorCommand::SetDisplayEnabled(enabled))
    }

    /// Request a manual test alert. Rejected if the category is disabled.
    pub fn trigger_test(&self, alert_type: AlertType) -> Result<()> {
        if !self.snapshots.borrow().toggles.get(alert_type) {
            return Err(MonitorError::CategoryDisabled(alert_type));
        }
        self.send(MonitorCommand::TriggerTest(alert_type))
    }

    /// Load the full alert history into the snapshot.
    pub fn refresh_history(&self) -> Result<()> {
        self.send(MonitorCommand::RefreshHistory)
    }

    /// Re-fetch the toggle configuration from the server.
    pub fn reload_config(&self) -> Result<()> {
        self.send(MonitorCommand::ReloadConfig)
    }

    /// Latest published state.
    pub fn snapshot(&self) -> MonitorSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<MonitorSnapshot> {
        self.snapshots.clone()
    }

    /// Stop the monitor and wait for it to finish. In-flight requests are
    /// aborted and no state changes after this returns.
    pub async fn shutdown(mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        if self.commands.send(MonitorCommand::Shutdown).is_err() {
            task.abort();
        }
        if let Err(e) = task.await
            && !e.is_cancelled()
        {
            warn!(error = %e, "alert monitor task failed");
        }
        info!("alert monitor stopped");
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            debug!("monitor handle dropped without shutdown, aborting");
            task.abort();
        }
    }
}

struct MonitorLoop {
    source: Arc<dyn AlertSource>,
    poller: PollingEngine,
    simulator: Option<AutoSimulator>,
    queue: ToastQueue,
    toggles: ToggleState,
    display_enabled: bool,
    history: Option<Vec<Alert>>,
    notice: Option<Notice>,
    stats: MonitorStats,
    /// The poll currently in flight
    poll_task: Option<task::Id>,
    tasks: JoinSet<TaskResult>,
    snapshot_tx: watch::Sender<MonitorSnapshot>,
}

async fn tick_optional(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

impl MonitorLoop {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<MonitorCommand>) {
        let mut poll_ticker = self.poller.ticker();
        let mut sim_ticker = self.simulator.as_ref().map(AutoSimulator::ticker);

        self.spawn_load();

        loop {
            let deadline = self.queue.next_deadline();

            tokio::select! {
                command = commands.recv() => match command {
                    Some(MonitorCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                _ = poll_ticker.tick() => self.on_poll_tick(),
                _ = tick_optional(&mut sim_ticker) => self.on_sim_tick(),
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    let expired = self.queue.expire_due(Instant::now());
                    self.stats.toasts_expired += expired.len() as u64;
                }
                Some(joined) = self.tasks.join_next() => match joined {
                    Ok(result) => self.handle_result(result),
                    Err(e) => self.handle_task_failure(e),
                },
            }

            self.publish();
        }

        self.tasks.abort_all();
        debug!("alert monitor loop exited");
    }

    fn handle_command(&mut self, command: MonitorCommand) {
        match command {
            MonitorCommand::Dismiss(id) => {
                if self.queue.dismiss(id).is_some() {
                    self.stats.toasts_dismissed += 1;
                }
            }
            MonitorCommand::SetToggle(alert_type, enabled) => match self.toggles.set(alert_type, enabled) {
                ToggleChange::Persist(toggles) => self.spawn_persist(toggles),
                ToggleChange::Queued | ToggleChange::Unchanged => {}
                ToggleChange::NotLoaded => {
                    debug!(%alert_type, "toggle ignored, alert settings not loaded")
                }
            },
            MonitorCommand::SetDisplayEnabled(enabled) => {
                info!(enabled, "alert display toggled");
                self.display_enabled = enabled;
            }
            MonitorCommand::TriggerTest(alert_type) => {
                if !self.toggles.local().get(alert_type) {
                    self.raise(MonitorError::CategoryDisabled(alert_type).to_string());
                    return;
                }
                let source = self.source.clone();
                self.tasks.spawn(async move {
                    let result = source
                        .trigger_test_alert(alert_type, alert_type.default_message())
                        .await;
                    TaskResult::Triggered(alert_type, result)
                });
            }
            MonitorCommand::RefreshHistory => {
                let source = self.source.clone();
                self.tasks
                    .spawn(async move { TaskResult::History(source.fetch_alert_history().await) });
            }
            MonitorCommand::ReloadConfig => self.spawn_load(),
            MonitorCommand::Shutdown => {}
        }
    }

    fn on_poll_tick(&mut self) {
        if !self.display_enabled || self.poll_task.is_some() {
            self.stats.polls_skipped += 1;
            return;
        }
        let poller = self.poller.clone();
        let handle = self
            .tasks
            .spawn(async move { TaskResult::Polled(poller.poll_once().await) });
        self.poll_task = Some(handle.id());
    }

    fn on_sim_tick(&mut self) {
        let toggles = self.toggles.local();
        let Some(simulator) = self.simulator.as_mut() else {
            return;
        };
        let Some(alert_type) = simulator.pick_category(&toggles) else {
            debug!("simulator tick skipped, no category enabled");
            return;
        };
        let source = self.source.clone();
        self.tasks.spawn(async move {
            TaskResult::Simulated(AutoSimulator::trigger(source, alert_type).await)
        });
    }

    fn spawn_load(&mut self) {
        let source = self.source.clone();
        self.tasks
            .spawn(async move { TaskResult::Loaded(source.fetch_alert_config().await) });
    }

    fn spawn_persist(&mut self, toggles: AlertToggleSet) {
        debug!(?toggles, "persisting alert toggles");
        let source = self.source.clone();
        self.tasks.spawn(async move {
            TaskResult::Persisted(source.update_alert_config(&toggles).await)
        });
    }

    fn handle_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::Polled(outcome) => {
                self.poll_task = None;
                match outcome {
                    PollOutcome::Delivered(alerts) => {
                        self.stats.polls_ok += 1;
                        self.stats.alerts_received += alerts.len() as u64;
                        self.queue.enqueue(alerts, Instant::now());
                    }
                    PollOutcome::Empty => self.stats.polls_ok += 1,
                    PollOutcome::Failed(_) => self.stats.polls_failed += 1,
                }
            }
            TaskResult::Simulated(SimOutcome::Triggered(_)) => self.stats.simulated += 1,
            TaskResult::Simulated(SimOutcome::Failed(_)) => self.stats.simulate_failed += 1,
            TaskResult::Simulated(SimOutcome::Skipped) => {}
            TaskResult::Loaded(Ok(toggles)) => {
                if self.toggles.apply_loaded(toggles) {
                    info!(?toggles, "alert toggles loaded");
                }
            }
            TaskResult::Loaded(Err(e)) => {
                warn!(error = %e, "failed to load alert toggles");
                self.raise(format!("Could not load alert settings: {}", e.friendly_message()));
            }
            TaskResult::Persisted(Ok(())) => {
                if let Some(next) = self.toggles.on_persist_ok() {
                    self.spawn_persist(next);
                }
            }
            TaskResult::Persisted(Err(e)) => {
                // Fail-soft: the toggle snapping back is the only feedback
                warn!(error = %e, "toggle persist failed, reverting");
                self.toggles.on_persist_err();
            }
            TaskResult::Triggered(alert_type, Ok(())) => {
                info!(%alert_type, "test alert triggered");
                self.notice = None;
            }
            TaskResult::Triggered(alert_type, Err(e)) => {
                warn!(%alert_type, error = %e, "test alert failed");
                self.raise(e.friendly_message());
            }
            TaskResult::History(Ok(alerts)) => {
                debug!(count = alerts.len(), "alert history loaded");
                self.history = Some(alerts);
                self.notice = None;
            }
            TaskResult::History(Err(e)) => {
                warn!(error = %e, "failed to load alert history");
                self.raise(e.friendly_message());
            }
        }
    }

    /// A request task panicked. A lost poll only costs its own tick.
    fn handle_task_failure(&mut self, error: task::JoinError) {
        if self.poll_task == Some(error.id()) {
            self.poll_task = None;
            self.stats.polls_failed += 1;
        }
        warn!(error = %error, "monitor request task failed");
    }

    fn raise(&mut self, message: String) {
        self.notice = Some(Notice {
            message,
            raised_at: Instant::now(),
        });
    }

    fn publish(&self) {
        let snapshot = MonitorSnapshot {
            toasts: self.queue.iter().cloned().collect(),
            toggles: self.toggles.local(),
            toggle_status: self.toggles.status(),
            toggles_loaded: self.toggles.is_loaded(),
            display_enabled: self.display_enabled,
            simulator_enabled: self.simulator.is_some(),
            history: self.history.clone(),
            notice: self.notice.clone(),
            stats: self.stats,
        };
        self.snapshot_tx.send_replace(snapshot);
    }
}
