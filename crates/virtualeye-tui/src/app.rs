//! Main application state and the terminal loop.
//!
//! The `App` runs on a plain thread. It reads state from the monitor's
//! snapshot channel and forwards hotkeys as monitor commands; it never
//! touches the pipeline state directly.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::{Frame, Terminal, backend::CrosstermBackend};
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use virtualeye_monitor::{MonitorError, MonitorHandle, MonitorSnapshot};

use crate::event::{AppEvent, InputHandler};
use crate::view::{self, ViewState};

/// Errors from the terminal loop.
#[derive(Error, Debug)]
pub enum TuiError {
    /// Raw mode, alternate screen or backend could not be set up
    #[error("Failed to set up terminal: {0}")]
    Setup(#[source] io::Error),

    /// Drawing a frame failed
    #[error("Failed to draw frame: {0}")]
    Draw(#[source] io::Error),

    /// Reading terminal input failed
    #[error("Failed to read terminal input: {0}")]
    Input(#[source] io::Error),

    /// The terminal could not be returned to normal mode
    #[error("Failed to restore terminal: {0}")]
    Restore(#[source] io::Error),
}

/// Result type for app operations.
pub type AppResult<T> = std::result::Result<T, TuiError>;

/// Redraw cadence for the toast countdowns.
const FRAME_DURATION: Duration = Duration::from_millis(100);

/// Main application state.
pub struct App<'a> {
    /// Monitor being displayed
    monitor: &'a MonitorHandle,
    /// Snapshot receiver, used to detect changes
    snapshots: watch::Receiver<MonitorSnapshot>,
    /// Input handler for key events
    input_handler: InputHandler,
    /// UI-only state
    view: ViewState,
    /// Whether the app should quit
    should_quit: bool,
}

impl<'a> App<'a> {
    /// Create an app displaying `monitor`.
    pub fn new(monitor: &'a MonitorHandle) -> Self {
        Self {
            monitor,
            snapshots: monitor.subscribe(),
            input_handler: InputHandler::new(),
            view: ViewState::default(),
            should_quit: false,
        }
    }

    /// Returns whether the app should quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// UI-only state.
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Handle a key event.
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        let event = self.input_handler.handle_key(key);
        self.handle_app_event(event);
    }

    /// Apply an application event.
    pub fn handle_app_event(&mut self, event: AppEvent) {
        if event != AppEvent::None {
            self.view.status_message = None;
        }

        let snapshot = self.monitor.snapshot();
        let result = match event {
            AppEvent::Quit | AppEvent::ForceQuit => {
                self.should_quit = true;
                Ok(())
            }
            AppEvent::ShowHelp => {
                self.view.show_help = true;
                Ok(())
            }
            AppEvent::HideHelp => {
                self.view.show_help = false;
                Ok(())
            }
            AppEvent::ToggleDisplay => self.monitor.set_display_enabled(!snapshot.display_enabled),
            AppEvent::ToggleCategory(alert_type) => self.monitor.toggle(alert_type),
            AppEvent::DismissOldest => match snapshot.oldest_toast() {
                Some(entry) => self.monitor.dismiss(entry.id),
                None => Ok(()),
            },
            AppEvent::TriggerTest => match snapshot.toggles.enabled_types().first() {
                Some(alert_type) => self.monitor.trigger_test(*alert_type),
                None => {
                    self.view.status_message =
                        Some("Enable an alert type to send a test alert".to_string());
                    Ok(())
                }
            },
            AppEvent::ToggleHistory => {
                self.view.show_history = !self.view.show_history;
                self.view.history_scroll = 0;
                if self.view.show_history {
                    self.monitor.refresh_history()
                } else {
                    Ok(())
                }
            }
            AppEvent::ReloadConfig => self.monitor.reload_config(),
            AppEvent::ScrollUp => {
                self.view.history_scroll = self.view.history_scroll.saturating_sub(1);
                Ok(())
            }
            AppEvent::ScrollDown => {
                let len = snapshot.history.as_ref().map_or(0, Vec::len);
                if self.view.history_scroll + 1 < len {
                    self.view.history_scroll += 1;
                }
                Ok(())
            }
            AppEvent::None => Ok(()),
        };

        match result {
            Ok(()) => {}
            Err(MonitorError::Stopped) => {
                warn!("alert monitor stopped, leaving UI");
                self.should_quit = true;
            }
            Err(e) => {
                debug!(error = %e, "hotkey rejected");
                self.view.status_message = Some(e.to_string());
            }
        }
    }

    /// Run the main application loop.
    pub fn run(&mut self) -> AppResult<()> {
        // Setup terminal
        crossterm::terminal::enable_raw_mode().map_err(TuiError::Setup)?;
        let mut stdout = io::stdout();
        crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen).map_err(TuiError::Setup)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).map_err(TuiError::Setup)?;

        info!("terminal UI started");
        let result = self.run_loop(&mut terminal);

        // Restore terminal
        crossterm::terminal::disable_raw_mode().map_err(TuiError::Restore)?;
        crossterm::execute!(terminal.backend_mut(), crossterm::terminal::LeaveAlternateScreen)
            .map_err(TuiError::Restore)?;
        terminal.show_cursor().map_err(TuiError::Restore)?;

        result
    }

    fn run_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> AppResult<()> {
        let mut last_draw: Option<Instant> = None;

        while !self.should_quit {
            let changed = self.snapshots.has_changed().unwrap_or(false);
            let stale = last_draw.is_none_or(|t| t.elapsed() >= FRAME_DURATION);

            if changed || stale {
                self.snapshots.mark_unchanged();
                terminal.draw(|frame| self.draw(frame)).map_err(TuiError::Draw)?;
                last_draw = Some(Instant::now());
            }

            if event::poll(FRAME_DURATION).map_err(TuiError::Input)?
                && let Event::Key(key) = event::read().map_err(TuiError::Input)?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key_event(key);
            }
        }
        Ok(())
    }

    /// Draw the UI.
    pub fn draw(&self, frame: &mut Frame) {
        let snapshot = self.monitor.snapshot();
        view::render(frame, &snapshot, &self.view, Instant::now());
    }
}
