//! Color palette for the VirtualEye TUI.

use ratatui::style::{Color, Modifier, Style};
use virtualeye_core::AlertSeverity;
use virtualeye_monitor::ToggleStatus;

/// Colors used across the interface.
#[derive(Debug, Clone)]
pub struct Palette {
    /// Titles and focused borders
    pub header: Color,
    /// Hotkey hints
    pub hotkey: Color,
    /// Normal text
    pub text: Color,
    /// Secondary text (timestamps, counters)
    pub text_dim: Color,
    /// Panel borders
    pub border: Color,
    /// Enabled toggles, display on
    pub on: Color,
    /// Disabled toggles, display off
    pub off: Color,
    /// Inline error notices
    pub error: Color,
    pub severity_high: Color,
    pub severity_medium: Color,
    pub severity_low: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            header: Color::Cyan,
            hotkey: Color::Yellow,
            text: Color::White,
            text_dim: Color::Gray,
            border: Color::DarkGray,
            on: Color::Green,
            off: Color::DarkGray,
            error: Color::Red,
            severity_high: Color::Red,
            severity_medium: Color::Yellow,
            severity_low: Color::Blue,
        }
    }
}

impl Palette {
    /// Color class for an alert severity.
    pub fn severity(&self, severity: AlertSeverity) -> Color {
        match severity {
            AlertSeverity::High => self.severity_high,
            AlertSeverity::Medium => self.severity_medium,
            AlertSeverity::Low => self.severity_low,
        }
    }

    /// Style for an on/off indicator.
    pub fn switch(&self, on: bool) -> Style {
        if on {
            Style::default().fg(self.on).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.off)
        }
    }

    /// Style for the toggle status marker.
    pub fn toggle_status(&self, status: ToggleStatus) -> Style {
        match status {
            ToggleStatus::RevertedOnError => Style::default().fg(self.error),
            ToggleStatus::Pending => Style::default().fg(self.hotkey),
            ToggleStatus::Idle | ToggleStatus::Committed => Style::default().fg(self.text_dim),
        }
    }
}
