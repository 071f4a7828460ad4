//! VirtualEye - live alert notifications in the terminal
//!
//! Polls the VirtualEye alert service and shows new detections as
//! short-lived notifications.
//!
//! ## Usage
//!
//! ```bash
//! # Start the dashboard against the configured backend
//! virtualeye
//!
//! # Log in first (password from VIRTUALEYE_PASSWORD)
//! virtualeye --email admin@virtualeye.local
//!
//! # No backend: in-memory alert service with the simulator on
//! virtualeye --demo
//!
//! # Print notifications as log lines instead of the terminal UI
//! virtualeye --headless --simulate
//! ```

use std::io::Write;
use std::panic;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use tokio::runtime::Runtime;
use tracing::{error, info, warn};
use virtualeye_client::{AlertSource, HttpAlertSource, MemoryAlertSource};
use virtualeye_core::{AlertToggleSet, Config, EyeError, LogGuard, init_logging};
use virtualeye_monitor::{AlertMonitor, MonitorHandle, ToastId};
use virtualeye_tui::App;

/// Environment variable holding the login password.
const PASSWORD_ENV: &str = "VIRTUALEYE_PASSWORD";

/// VirtualEye alert notifications
///
/// Shows motion, human and camera-covered detections from the VirtualEye
/// alert service as they arrive.
#[derive(Parser, Debug)]
#[command(name = "virtualeye")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging (increases log level)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory for log files (defaults to ~/.virtualeye/logs/)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Config file (defaults to ~/.virtualeye/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print notifications instead of starting the terminal UI
    #[arg(long)]
    headless: bool,

    /// Use an in-memory alert service with the simulator on
    #[arg(long)]
    demo: bool,

    /// Enable the alert auto-simulator
    #[arg(long)]
    simulate: bool,

    /// Log in with this email (password from VIRTUALEYE_PASSWORD)
    #[arg(long)]
    email: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match setup_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::from(1);
        }
    };

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            eprintln!("Error: {}", e);
            if let Some(hint) = e.guidance() {
                eprintln!("{}", hint);
            }
            return ExitCode::from(1);
        }
    };

    if !cli.headless {
        install_panic_hook();
    }

    info!(demo = cli.demo, headless = cli.headless, "Starting VirtualEye");

    match run(&cli, config) {
        Ok(()) => {
            info!("VirtualEye exited normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("VirtualEye error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

/// Install a panic hook that restores the terminal before printing the panic message.
fn install_panic_hook() {
    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

/// Restore terminal to its normal state.
fn restore_terminal() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();

    let _ = crossterm::terminal::disable_raw_mode();
    crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen)?;
    crossterm::execute!(stdout, crossterm::cursor::Show)?;
    stdout.flush()?;

    Ok(())
}

/// Set up logging based on CLI arguments.
///
/// Console output is only enabled in headless mode; in the terminal UI it
/// would draw over the alternate screen.
fn setup_logging(cli: &Cli) -> Result<LogGuard, EyeError> {
    init_logging(cli.log_dir.clone(), cli.verbose > 0, cli.headless)
}

fn run(cli: &Cli, config: Config) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("virtualeye-rt")
        .build()
        .context("failed to start async runtime")?;

    let mut monitor_config = config.monitor.clone();
    if cli.simulate || cli.demo {
        monitor_config.simulator.enabled = true;
    }

    let source: Arc<dyn AlertSource> = if cli.demo {
        info!("demo mode: using in-memory alert service");
        Arc::new(
            MemoryAlertSource::new()
                .with_toggles(AlertToggleSet::all_enabled())
                .with_latency(Duration::from_millis(150)),
        )
    } else {
        runtime.block_on(connect(cli, &config))?
    };

    let monitor = {
        let _enter = runtime.enter();
        AlertMonitor::spawn(source, &monitor_config)
    };

    if cli.headless {
        runtime.block_on(run_headless(monitor))
    } else {
        run_tui(&runtime, monitor)
    }
}

/// Build the HTTP alert source, check the backend and log in if requested.
async fn connect(cli: &Cli, config: &Config) -> anyhow::Result<Arc<dyn AlertSource>> {
    let source = HttpAlertSource::from_config(&config.api)?;
    info!(base_url = source.base_url(), "using alert service");

    match source.health().await {
        Ok(health) if health.is_ok() => info!(service = %health.service, "alert service healthy"),
        Ok(health) => warn!(status = %health.status, "alert service reports a problem"),
        Err(e) if e.is_network_error() => {
            warn!(base_url = source.base_url(), error = %e, "alert service unreachable")
        }
        Err(e) => warn!(error = %e, "alert service health check failed"),
    }

    if let Some(email) = &cli.email {
        let Ok(password) = std::env::var(PASSWORD_ENV) else {
            bail!("{PASSWORD_ENV} must be set when --email is given");
        };
        source
            .login(email, &password)
            .await
            .map_err(|e| anyhow::anyhow!("Login failed: {}", e.friendly_message()))?;
        info!(email = %email, "logged in");
    } else if !source.has_token() {
        warn!(
            token_env = %config.api.token_env,
            "no session token; alert requests will be rejected until you log in"
        );
    }

    Ok(Arc::new(source))
}

/// Run the terminal UI on this thread while the monitor runs on the runtime.
fn run_tui(runtime: &Runtime, monitor: MonitorHandle) -> anyhow::Result<()> {
    let result = App::new(&monitor).run();
    runtime.block_on(monitor.shutdown());
    result.context("terminal UI failed")
}

/// Print each new notification until Ctrl-C.
async fn run_headless(monitor: MonitorHandle) -> anyhow::Result<()> {
    let mut snapshots = monitor.subscribe();
    let mut last_seen: Option<ToastId> = None;
    let mut last_notice = None;

    println!("Watching for alerts. Press Ctrl-C to stop.");

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(error = %e, "failed to listen for Ctrl-C");
                }
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    warn!("alert monitor stopped unexpectedly");
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();

                let seen_before = last_seen;
                for entry in snapshot.toasts.iter().filter(|t| seen_before.is_none_or(|id| t.id > id)) {
                    println!(
                        "{}  {:<6} {}",
                        entry.alert.timestamp.format("%H:%M:%S"),
                        entry.alert.severity.label(),
                        entry.alert.format_compact()
                    );
                    last_seen = Some(entry.id);
                }

                if snapshot.notice != last_notice {
                    if let Some(notice) = &snapshot.notice {
                        eprintln!("! {}", notice.message);
                    }
                    last_notice = snapshot.notice;
                }
            }
        }
    }

    monitor.shutdown().await;
    Ok(())
}
