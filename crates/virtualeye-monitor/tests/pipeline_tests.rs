//! End-to-end pipeline tests on a paused clock.
//!
//! The monitor runs against a [`MemoryAlertSource`]; virtual time advances
//! only when every task is idle, so intervals and lifetimes can be asserted
//! exactly.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::Instant;
use virtualeye_client::{AlertSource, MemoryAlertSource, Operation, Result as ClientResult};
use virtualeye_core::{Alert, AlertToggleSet, AlertType, MonitorConfig};
use virtualeye_monitor::{
    AlertMonitor, AutoSimulator, MonitorError, MonitorSnapshot, ToggleStatus,
};

const POLL: Duration = Duration::from_millis(3000);
const LIFETIME: Duration = Duration::from_millis(5000);
const SIM: Duration = Duration::from_millis(15000);
const TICK: Duration = Duration::from_millis(1);

fn config() -> MonitorConfig {
    MonitorConfig::default()
        .with_poll_interval(POLL)
        .with_toast_lifetime(LIFETIME)
}

async fn wait_for(
    rx: &mut watch::Receiver<MonitorSnapshot>,
    predicate: impl FnMut(&MonitorSnapshot) -> bool,
) -> MonitorSnapshot {
    let snapshot = tokio::time::timeout(Duration::from_secs(300), rx.wait_for(predicate))
        .await
        .expect("condition not reached in time")
        .expect("monitor stopped");
    snapshot.clone()
}

fn ids(snapshot: &MonitorSnapshot) -> Vec<String> {
    snapshot
        .toasts
        .iter()
        .filter_map(|t| t.alert.id.clone())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_polled_alert_is_shown_then_expires() {
    let source = Arc::new(MemoryAlertSource::new());
    let timestamp: DateTime<Utc> = "2026-10-16T08:30:00Z".parse().unwrap();
    source.inject([Alert::new(AlertType::Human, "Person detected")
        .with_id("a1")
        .with_timestamp(timestamp)]);

    let monitor = AlertMonitor::spawn(source.clone(), &config());
    let mut rx = monitor.subscribe();
    let start = Instant::now();

    let shown = wait_for(&mut rx, |s| !s.toasts.is_empty()).await;
    assert_eq!(start.elapsed(), POLL);
    assert_eq!(shown.toasts.len(), 1);

    let alert = &shown.toasts[0].alert;
    assert_eq!(alert.id.as_deref(), Some("a1"));
    assert_eq!(alert.alert_type, AlertType::Human);
    assert_eq!(alert.message, "Person detected");
    assert_eq!(alert.timestamp, timestamp);

    let shown_at = Instant::now();
    let gone = wait_for(&mut rx, |s| s.toasts.is_empty()).await;
    let lifetime = shown_at.elapsed();
    assert!(lifetime >= LIFETIME && lifetime <= LIFETIME + TICK, "lifetime was {lifetime:?}");
    assert_eq!(gone.stats.toasts_expired, 1);
    assert_eq!(gone.stats.toasts_dismissed, 0);

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_every_enqueued_alert_is_shown() {
    let source = Arc::new(MemoryAlertSource::new());
    let monitor = AlertMonitor::spawn(source.clone(), &config());
    let mut rx = monitor.subscribe();

    source.inject((0..12).map(|n| Alert::new(AlertType::Motion, "m").with_id(format!("m{n}"))));
    let snapshot = wait_for(&mut rx, |s| !s.toasts.is_empty()).await;
    assert_eq!(snapshot.toasts.len(), 12);
    assert_eq!(ids(&snapshot)[0], "m0");
    assert_eq!(ids(&snapshot)[11], "m11");

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_removes_only_the_target() {
    let source = Arc::new(MemoryAlertSource::new());
    source.inject([
        Alert::new(AlertType::Motion, "x").with_id("x"),
        Alert::new(AlertType::Human, "y").with_id("y"),
        Alert::new(AlertType::CameraCovered, "z").with_id("z"),
    ]);

    let monitor = AlertMonitor::spawn(source.clone(), &config());
    let mut rx = monitor.subscribe();
    let shown = wait_for(&mut rx, |s| s.toasts.len() == 3).await;

    let target = shown.toasts[1].id;
    monitor.dismiss(target).unwrap();
    let after = wait_for(&mut rx, |s| s.toasts.len() == 2).await;
    assert_eq!(ids(&after), vec!["x", "z"]);
    assert_eq!(after.stats.toasts_dismissed, 1);

    // Dismissing again is a no-op
    monitor.dismiss(target).unwrap();

    // The survivors still expire on their own deadlines; the dismissed entry
    // is never removed a second time.
    let done = wait_for(&mut rx, |s| s.toasts.is_empty()).await;
    assert_eq!(done.stats.toasts_expired, 2);
    assert_eq!(done.stats.toasts_dismissed, 1);

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_with_arrivals_in_between() {
    let source = Arc::new(MemoryAlertSource::new());
    source.inject([Alert::new(AlertType::Motion, "old").with_id("old")]);

    let monitor = AlertMonitor::spawn(source.clone(), &config());
    let mut rx = monitor.subscribe();
    let first = wait_for(&mut rx, |s| s.toasts.len() == 1).await;
    let old_id = first.toasts[0].id;

    source.inject([Alert::new(AlertType::Human, "new").with_id("new")]);
    wait_for(&mut rx, |s| s.toasts.len() == 2).await;

    monitor.dismiss(old_id).unwrap();
    let after = wait_for(&mut rx, |s| s.toasts.len() == 1).await;
    assert_eq!(ids(&after), vec!["new"]);

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_polls_are_skipped() {
    let source = Arc::new(MemoryAlertSource::new());
    source.fail_next(Operation::FetchRecent, 2);
    source.inject([Alert::new(AlertType::Motion, "m").with_id("m1")]);

    let monitor = AlertMonitor::spawn(source.clone(), &config());
    let mut rx = monitor.subscribe();
    let start = Instant::now();

    let shown = wait_for(&mut rx, |s| !s.toasts.is_empty()).await;
    assert_eq!(start.elapsed(), POLL * 3);
    assert_eq!(shown.stats.polls_failed, 2);
    assert_eq!(shown.stats.polls_ok, 1);
    assert!(shown.notice.is_none(), "background failures are never surfaced");

    monitor.shutdown().await;
}

/// Delegates to a memory source, but the first recent-alerts fetch panics.
struct PanickingSource {
    inner: MemoryAlertSource,
    armed: AtomicBool,
}

#[async_trait]
impl AlertSource for PanickingSource {
    async fn fetch_recent_alerts(&self) -> ClientResult<Vec<Alert>> {
        if self.armed.swap(false, Ordering::SeqCst) {
            panic!("malformed alert payload");
        }
        self.inner.fetch_recent_alerts().await
    }

    async fn fetch_alert_config(&self) -> ClientResult<AlertToggleSet> {
        self.inner.fetch_alert_config().await
    }

    async fn update_alert_config(&self, toggles: &AlertToggleSet) -> ClientResult<()> {
        self.inner.update_alert_config(toggles).await
    }

    async fn trigger_test_alert(&self, alert_type: AlertType, message: &str) -> ClientResult<()> {
        self.inner.trigger_test_alert(alert_type, message).await
    }

    async fn fetch_alert_history(&self) -> ClientResult<Vec<Alert>> {
        self.inner.fetch_alert_history().await
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

#[tokio::test(start_paused = true)]
async fn test_panicked_poll_does_not_stop_polling() {
    let inner = MemoryAlertSource::new();
    inner.inject([Alert::new(AlertType::Human, "Person detected").with_id("h1")]);
    let source = Arc::new(PanickingSource {
        inner,
        armed: AtomicBool::new(true),
    });

    let monitor = AlertMonitor::spawn(source.clone(), &config());
    let mut rx = monitor.subscribe();
    let start = Instant::now();

    let shown = wait_for(&mut rx, |s| !s.toasts.is_empty()).await;
    assert_eq!(start.elapsed(), POLL * 2, "the next tick polls again");
    assert_eq!(ids(&shown), vec!["h1"]);
    assert_eq!(shown.stats.polls_failed, 1);
    assert_eq!(shown.stats.polls_ok, 1);
    assert_eq!(shown.stats.polls_skipped, 0);

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_display_off_skips_polling() {
    let source = Arc::new(MemoryAlertSource::new());
    source.inject([Alert::new(AlertType::Motion, "m").with_id("m1")]);

    let mut cfg = config();
    cfg.display_enabled = false;
    let monitor = AlertMonitor::spawn(source.clone(), &cfg);
    let mut rx = monitor.subscribe();

    tokio::time::sleep(POLL * 4).await;
    assert_eq!(source.calls(Operation::FetchRecent), 0);

    monitor.set_display_enabled(true).unwrap();
    let shown = wait_for(&mut rx, |s| !s.toasts.is_empty()).await;
    assert!(shown.display_enabled);
    assert_eq!(shown.visible_toasts().len(), 1);
    assert!(shown.stats.polls_skipped >= 3);

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_simulator_idle_when_all_categories_disabled() {
    let source = Arc::new(MemoryAlertSource::new());
    let cfg = config().with_simulator(true).with_simulator_interval(SIM);
    let monitor = AlertMonitor::spawn(source.clone(), &cfg);

    tokio::time::sleep(SIM * 6 + TICK).await;

    assert_eq!(source.calls(Operation::FetchConfig), 1);
    assert_eq!(source.calls(Operation::Trigger), 0);
    assert_eq!(monitor.snapshot().stats.simulated, 0);

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_simulator_only_triggers_enabled_category() {
    let toggles = AlertToggleSet::default().with(AlertType::Motion, true);
    let source = Arc::new(MemoryAlertSource::new().with_toggles(toggles));
    let cfg = config().with_simulator(true).with_simulator_interval(SIM);
    let monitor = AlertMonitor::spawn_with(
        source.clone(),
        &cfg,
        Some(AutoSimulator::with_seed(SIM, 99)),
    );

    tokio::time::sleep(SIM * 10 + TICK).await;

    let triggered = source.triggered();
    assert_eq!(triggered.len(), 10);
    for (alert_type, message) in &triggered {
        assert_eq!(*alert_type, AlertType::Motion);
        assert!(message.starts_with("[simulated]"));
    }

    let snapshot = monitor.snapshot();
    assert_eq!(snapshot.stats.simulated, 10);
    assert!(snapshot.toasts.iter().all(|t| t.alert.simulated));

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_simulator_failures_are_swallowed() {
    let source = Arc::new(MemoryAlertSource::new().with_toggles(AlertToggleSet::all_enabled()));
    source.fail_next(Operation::Trigger, 1);
    let cfg = config().with_simulator(true).with_simulator_interval(SIM);
    let monitor = AlertMonitor::spawn(source.clone(), &cfg);

    tokio::time::sleep(SIM * 2 + TICK).await;

    let snapshot = monitor.snapshot();
    assert_eq!(snapshot.stats.simulate_failed, 1);
    assert_eq!(snapshot.stats.simulated, 1);
    assert!(snapshot.notice.is_none());

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_toggle_off_then_on_is_immediate() {
    let source = Arc::new(
        MemoryAlertSource::new()
            .with_toggles(AlertToggleSet::all_enabled())
            .with_latency(Duration::from_millis(500)),
    );
    let monitor = AlertMonitor::spawn(source.clone(), &config());
    let mut rx = monitor.subscribe();
    wait_for(&mut rx, |s| s.toggles_loaded).await;

    let before = Instant::now();
    monitor.set_toggle(AlertType::Motion, false).unwrap();
    let off = wait_for(&mut rx, |s| !s.toggles.motion).await;
    assert_eq!(off.toggle_status, ToggleStatus::Pending);

    monitor.set_toggle(AlertType::Motion, true).unwrap();
    wait_for(&mut rx, |s| s.toggles.motion).await;
    assert_eq!(before.elapsed(), Duration::ZERO, "local value visible without a round trip");

    let settled = wait_for(&mut rx, |s| s.toggle_status == ToggleStatus::Committed).await;
    assert_eq!(settled.toggles, AlertToggleSet::all_enabled());
    assert_eq!(source.stored_toggles(), AlertToggleSet::all_enabled());
    // Serialized: the second set went out only after the first completed
    assert_eq!(source.calls(Operation::UpdateConfig), 2);

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_toggle_before_load_keeps_server_settings() {
    let server = AlertToggleSet::default().with(AlertType::Human, true);
    let source = Arc::new(
        MemoryAlertSource::new()
            .with_toggles(server)
            .with_latency(Duration::from_millis(200)),
    );
    let monitor = AlertMonitor::spawn(source.clone(), &config());
    let mut rx = monitor.subscribe();

    let err = monitor.set_toggle(AlertType::Motion, true).unwrap_err();
    assert!(matches!(err, MonitorError::SettingsNotLoaded));
    assert!(matches!(monitor.toggle(AlertType::Human), Err(MonitorError::SettingsNotLoaded)));

    let loaded = wait_for(&mut rx, |s| s.toggles_loaded).await;
    assert_eq!(loaded.toggles, server);
    assert_eq!(source.stored_toggles(), server);
    assert_eq!(source.calls(Operation::UpdateConfig), 0);

    // Once loaded, a toggle changes only its own category
    monitor.set_toggle(AlertType::Motion, true).unwrap();
    let committed = wait_for(&mut rx, |s| s.toggle_status == ToggleStatus::Committed).await;
    let expected = server.with(AlertType::Motion, true);
    assert_eq!(committed.toggles, expected);
    assert!(committed.toggles_loaded);
    assert_eq!(source.stored_toggles(), expected);

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_toggle_persist_failure_reverts() {
    let source = Arc::new(MemoryAlertSource::new().with_toggles(AlertToggleSet::all_enabled()));
    source.fail_next(Operation::UpdateConfig, 1);

    let monitor = AlertMonitor::spawn(source.clone(), &config());
    let mut rx = monitor.subscribe();
    wait_for(&mut rx, |s| s.toggles_loaded).await;

    monitor.set_toggle(AlertType::Human, false).unwrap();
    let reverted = wait_for(&mut rx, |s| s.toggle_status == ToggleStatus::RevertedOnError).await;

    assert!(reverted.toggles.human);
    assert_eq!(reverted.toggles, AlertToggleSet::all_enabled());
    assert!(reverted.notice.is_none(), "a revert is the only feedback");
    assert_eq!(source.stored_toggles(), AlertToggleSet::all_enabled());

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_trigger_test_rejects_disabled_category() {
    let toggles = AlertToggleSet::default().with(AlertType::Human, true);
    let source = Arc::new(MemoryAlertSource::new().with_toggles(toggles));

    let monitor = AlertMonitor::spawn(source.clone(), &config());
    let mut rx = monitor.subscribe();
    wait_for(&mut rx, |s| s.toggles_loaded).await;

    let err = monitor.trigger_test(AlertType::Motion).unwrap_err();
    assert!(matches!(err, MonitorError::CategoryDisabled(AlertType::Motion)));

    monitor.trigger_test(AlertType::Human).unwrap();
    let shown = wait_for(&mut rx, |s| !s.toasts.is_empty()).await;
    assert_eq!(shown.toasts[0].alert.alert_type, AlertType::Human);
    assert_eq!(source.triggered().len(), 1);

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_foreground_failure_sets_notice() {
    let source = Arc::new(MemoryAlertSource::new());
    source.fail_next(Operation::FetchHistory, 1);
    source.inject([Alert::new(AlertType::Motion, "m").with_id("h1")]);

    let monitor = AlertMonitor::spawn(source.clone(), &config());
    let mut rx = monitor.subscribe();

    monitor.refresh_history().unwrap();
    let failed = wait_for(&mut rx, |s| s.notice.is_some()).await;
    assert!(failed.history.is_none());

    monitor.refresh_history().unwrap();
    let loaded = wait_for(&mut rx, |s| s.history.is_some()).await;
    assert_eq!(loaded.history.unwrap().len(), 1);
    assert!(loaded.notice.is_none());

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_reload_config_picks_up_server_changes() {
    let source = Arc::new(MemoryAlertSource::new());
    let monitor = AlertMonitor::spawn(source.clone(), &config());
    let mut rx = monitor.subscribe();
    wait_for(&mut rx, |s| s.toggles_loaded).await;

    let changed = AlertToggleSet::default().with(AlertType::CameraCovered, true);
    source.update_alert_config(&changed).await.unwrap();

    monitor.reload_config().unwrap();
    let reloaded = wait_for(&mut rx, |s| s.toggles == changed).await;
    assert_eq!(reloaded.toggle_status, ToggleStatus::Idle);

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_no_state_changes_after_shutdown() {
    let source = Arc::new(MemoryAlertSource::new().with_toggles(AlertToggleSet::all_enabled()));
    let cfg = config().with_simulator(true).with_simulator_interval(SIM);
    let monitor = AlertMonitor::spawn(source.clone(), &cfg);
    let mut rx = monitor.subscribe();
    wait_for(&mut rx, |s| s.toggles_loaded).await;

    monitor.shutdown().await;
    let polls = source.calls(Operation::FetchRecent);
    let triggers = source.calls(Operation::Trigger);

    source.inject([Alert::new(AlertType::Motion, "late").with_id("late")]);
    tokio::time::sleep(SIM * 4).await;

    assert_eq!(source.calls(Operation::FetchRecent), polls);
    assert_eq!(source.calls(Operation::Trigger), triggers);
    assert!(rx.has_changed().is_err(), "the snapshot channel is closed");
    assert!(rx.borrow().toasts.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_stops_monitor() {
    let source = Arc::new(MemoryAlertSource::new());
    let monitor = AlertMonitor::spawn(source.clone(), &config());
    let rx = monitor.subscribe();
    drop(monitor);

    tokio::time::sleep(POLL * 3).await;
    assert_eq!(source.calls(Operation::FetchRecent), 0);
    assert!(rx.has_changed().is_err());
}
