//! Event handling for the VirtualEye TUI.
//!
//! Converts key presses into application events.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use virtualeye_core::AlertType;

/// Application-level events that can trigger state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// Flip the alerts on/off control
    ToggleDisplay,
    /// Flip one alert category
    ToggleCategory(AlertType),
    /// Dismiss the oldest visible toast
    DismissOldest,
    /// Trigger a test alert for the first enabled category
    TriggerTest,
    /// Show or hide the history panel
    ToggleHistory,
    /// Re-fetch the toggle configuration
    ReloadConfig,
    /// Scroll the history panel up
    ScrollUp,
    /// Scroll the history panel down
    ScrollDown,
    /// Show help overlay
    ShowHelp,
    /// Hide help overlay
    HideHelp,
    /// Request application quit
    Quit,
    /// Force quit (Ctrl+C)
    ForceQuit,
    /// No action needed
    None,
}

/// Input handler for converting key events to app events.
#[derive(Debug, Default)]
pub struct InputHandler {
    /// Whether the help overlay is open
    help_open: bool,
}

impl InputHandler {
    /// Create a new input handler.
    pub fn new() -> Self {
        Self { help_open: false }
    }

    /// Returns whether the help overlay is open.
    pub fn is_help_open(&self) -> bool {
        self.help_open
    }

    /// Handle a key event and return the corresponding app event.
    pub fn handle_key(&mut self, key: KeyEvent) -> AppEvent {
        // Ctrl+C always force quits
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return AppEvent::ForceQuit;
        }

        // Any key closes help
        if self.help_open {
            self.help_open = false;
            return AppEvent::HideHelp;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => AppEvent::Quit,

            KeyCode::Char('?') => {
                self.help_open = true;
                AppEvent::ShowHelp
            }

            KeyCode::Char('a') | KeyCode::Char('A') => AppEvent::ToggleDisplay,
            KeyCode::Char('1') => AppEvent::ToggleCategory(AlertType::Motion),
            KeyCode::Char('2') => AppEvent::ToggleCategory(AlertType::Human),
            KeyCode::Char('3') => AppEvent::ToggleCategory(AlertType::CameraCovered),

            KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Delete => AppEvent::DismissOldest,
            KeyCode::Char('t') | KeyCode::Char('T') => AppEvent::TriggerTest,
            KeyCode::Char('h') | KeyCode::Char('H') => AppEvent::ToggleHistory,
            KeyCode::Char('r') | KeyCode::Char('R') => AppEvent::ReloadConfig,

            KeyCode::Up | KeyCode::Char('k') => AppEvent::ScrollUp,
            KeyCode::Down | KeyCode::Char('j') => AppEvent::ScrollDown,

            _ => AppEvent::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_event(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_category_hotkeys() {
        let mut handler = InputHandler::new();

        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('1'))),
            AppEvent::ToggleCategory(AlertType::Motion)
        );
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('2'))),
            AppEvent::ToggleCategory(AlertType::Human)
        );
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('3'))),
            AppEvent::ToggleCategory(AlertType::CameraCovered)
        );
    }

    #[test]
    fn test_action_hotkeys() {
        let mut handler = InputHandler::new();

        assert_eq!(handler.handle_key(key_event(KeyCode::Char('a'))), AppEvent::ToggleDisplay);
        assert_eq!(handler.handle_key(key_event(KeyCode::Char('d'))), AppEvent::DismissOldest);
        assert_eq!(handler.handle_key(key_event(KeyCode::Char('t'))), AppEvent::TriggerTest);
        assert_eq!(handler.handle_key(key_event(KeyCode::Char('h'))), AppEvent::ToggleHistory);
        assert_eq!(handler.handle_key(key_event(KeyCode::Char('r'))), AppEvent::ReloadConfig);
        assert_eq!(handler.handle_key(key_event(KeyCode::Char('q'))), AppEvent::Quit);
    }

    #[test]
    fn test_ctrl_c_force_quit() {
        let mut handler = InputHandler::new();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);

        assert_eq!(handler.handle_key(ctrl_c), AppEvent::ForceQuit);

        // Also works with help open
        handler.handle_key(key_event(KeyCode::Char('?')));
        assert_eq!(handler.handle_key(ctrl_c), AppEvent::ForceQuit);
    }

    #[test]
    fn test_help_closes_on_any_key() {
        let mut handler = InputHandler::new();

        assert_eq!(handler.handle_key(key_event(KeyCode::Char('?'))), AppEvent::ShowHelp);
        assert!(handler.is_help_open());

        // 'q' closes help instead of quitting
        assert_eq!(handler.handle_key(key_event(KeyCode::Char('q'))), AppEvent::HideHelp);
        assert!(!handler.is_help_open());
        assert_eq!(handler.handle_key(key_event(KeyCode::Char('q'))), AppEvent::Quit);
    }

    #[test]
    fn test_case_insensitive_hotkeys() {
        let mut handler = InputHandler::new();

        assert_eq!(handler.handle_key(key_event(KeyCode::Char('A'))), AppEvent::ToggleDisplay);
        assert_eq!(handler.handle_key(key_event(KeyCode::Char('Q'))), AppEvent::Quit);
    }

    #[test]
    fn test_unbound_key_is_none() {
        let mut handler = InputHandler::new();
        assert_eq!(handler.handle_key(key_event(KeyCode::Char('z'))), AppEvent::None);
        assert_eq!(handler.handle_key(key_event(KeyCode::Char('4'))), AppEvent::None);
    }
}
