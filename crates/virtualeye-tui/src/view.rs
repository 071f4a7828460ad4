//! Rendering of the monitor state.
//!
//! Everything here is a pure function of a [`MonitorSnapshot`], the local
//! [`ViewState`] and the current instant.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tokio::time::Instant;
use virtualeye_core::AlertType;
use virtualeye_monitor::{MonitorSnapshot, ToastEntry};

use crate::theme::Palette;

/// UI-only state that is not part of the monitor.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    /// History panel visible
    pub show_history: bool,
    /// First history row shown
    pub history_scroll: usize,
    /// Help overlay visible
    pub show_help: bool,
    /// Local status line (e.g. a rejected hotkey)
    pub status_message: Option<String>,
}

/// Draw the whole interface.
pub fn render(frame: &mut Frame, snapshot: &MonitorSnapshot, view: &ViewState, now: Instant) {
    let palette = Palette::default();
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header
            Constraint::Min(5),    // Content
            Constraint::Length(1), // Notice
            Constraint::Length(2), // Footer
        ])
        .split(area);

    draw_header(frame, chunks[0], snapshot, &palette);

    if view.show_history {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(chunks[1]);
        draw_toasts(frame, columns[0], snapshot, now, &palette);
        draw_history(frame, columns[1], snapshot, view.history_scroll, &palette);
    } else {
        draw_toasts(frame, chunks[1], snapshot, now, &palette);
    }

    draw_notice(frame, chunks[2], snapshot, view, &palette);
    draw_footer(frame, chunks[3], &palette);

    if view.show_help {
        draw_help_overlay(frame, area, &palette);
    }
}

fn draw_header(frame: &mut Frame, area: Rect, snapshot: &MonitorSnapshot, palette: &Palette) {
    let display = if snapshot.display_enabled { "ON" } else { "OFF" };

    let mut title = vec![
        Span::styled(
            " VirtualEye Alerts ",
            Style::default().fg(palette.header).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled("[a] Alerts: ", Style::default().fg(palette.text_dim)),
        Span::styled(display, palette.switch(snapshot.display_enabled)),
    ];
    if snapshot.simulator_enabled {
        title.push(Span::styled("  simulator", Style::default().fg(palette.hotkey)));
    }

    let mut toggles = Vec::new();
    if snapshot.toggles_loaded {
        for (n, alert_type) in AlertType::ALL.iter().enumerate() {
            let enabled = snapshot.toggles.get(*alert_type);
            let mark = if enabled { "■" } else { "□" };
            toggles.push(Span::styled(format!("[{}] ", n + 1), Style::default().fg(palette.hotkey)));
            toggles.push(Span::styled(
                format!("{mark} {}  ", alert_type.label()),
                palette.switch(enabled),
            ));
        }
        let marker = snapshot.toggle_status.marker();
        if !marker.is_empty() {
            toggles.push(Span::styled(marker, palette.toggle_status(snapshot.toggle_status)));
        }
    } else {
        toggles.push(Span::styled(
            "Loading alert settings...",
            Style::default().fg(palette.text_dim),
        ));
    }

    let stats = snapshot.stats;
    let counters = format!(
        "polls {} ok / {} failed   received {}   simulated {}",
        stats.polls_ok, stats.polls_failed, stats.alerts_received, stats.simulated
    );

    let header = Paragraph::new(vec![
        Line::from(title),
        Line::from(toggles),
        Line::from(Span::styled(counters, Style::default().fg(palette.text_dim))),
    ])
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(palette.border)),
    );

    frame.render_widget(header, area);
}

/// Cells in the lifetime gauge.
const GAUGE_WIDTH: usize = 10;

/// Lifetime gauge, full when the toast is new and empty when it expires.
fn lifetime_gauge(ratio: f64) -> String {
    let filled = ((ratio.clamp(0.0, 1.0) * GAUGE_WIDTH as f64).ceil() as usize).min(GAUGE_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(GAUGE_WIDTH - filled))
}

/// One line for a toast.
pub fn toast_line(entry: &ToastEntry, now: Instant, palette: &Palette) -> Line<'static> {
    let remaining = entry.remaining(now).as_secs_f64();
    let color = palette.severity(entry.alert.severity);
    Line::from(vec![
        Span::styled(
            format!("{} ", lifetime_gauge(entry.remaining_ratio(now))),
            Style::default().fg(color),
        ),
        Span::styled(
            format!("{:<6} ", entry.alert.severity.label()),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(entry.alert.format_compact(), Style::default().fg(palette.text)),
        Span::styled(format!("  {remaining:.1}s"), Style::default().fg(palette.text_dim)),
    ])
}

fn draw_toasts(frame: &mut Frame, area: Rect, snapshot: &MonitorSnapshot, now: Instant, palette: &Palette) {
    let toasts = snapshot.visible_toasts();
    let title = format!(" Notifications ({}) ", toasts.len());

    let lines: Vec<Line> = if !snapshot.display_enabled {
        vec![Line::from(Span::styled(
            "Alerts are off. Press [a] to turn them on.",
            Style::default().fg(palette.text_dim),
        ))]
    } else if toasts.is_empty() {
        vec![Line::from(Span::styled(
            "No new alerts",
            Style::default().fg(palette.text_dim),
        ))]
    } else {
        // Newest at the bottom; keep the tail when the panel is too short
        let rows = area.height.saturating_sub(2) as usize;
        let skip = toasts.len().saturating_sub(rows);
        toasts
            .iter()
            .skip(skip)
            .map(|entry| toast_line(entry, now, palette))
            .collect()
    };

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .title(Span::styled(title, Style::default().fg(palette.header))),
    );
    frame.render_widget(panel, area);
}

fn draw_history(frame: &mut Frame, area: Rect, snapshot: &MonitorSnapshot, scroll: usize, palette: &Palette) {
    let lines: Vec<Line> = match &snapshot.history {
        None => vec![Line::from(Span::styled(
            "Loading history...",
            Style::default().fg(palette.text_dim),
        ))],
        Some(alerts) if alerts.is_empty() => vec![Line::from(Span::styled(
            "No alerts recorded",
            Style::default().fg(palette.text_dim),
        ))],
        Some(alerts) => alerts
            .iter()
            .skip(scroll)
            .map(|alert| {
                Line::from(Span::styled(
                    alert.format_detail(),
                    Style::default().fg(palette.severity(alert.severity)),
                ))
            })
            .collect(),
    };

    let count = snapshot.history.as_ref().map_or(0, Vec::len);
    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .title(Span::styled(format!(" History ({count}) "), Style::default().fg(palette.header))),
    )
    .wrap(Wrap { trim: false });
    frame.render_widget(panel, area);
}

fn draw_notice(frame: &mut Frame, area: Rect, snapshot: &MonitorSnapshot, view: &ViewState, palette: &Palette) {
    let line = match (&view.status_message, &snapshot.notice) {
        (Some(message), _) => Line::from(Span::styled(message.clone(), Style::default().fg(palette.hotkey))),
        (None, Some(notice)) => Line::from(Span::styled(
            format!("✖ {}", notice.message),
            Style::default().fg(palette.error),
        )),
        (None, None) => Line::default(),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_footer(frame: &mut Frame, area: Rect, palette: &Palette) {
    let hotkey = Style::default().fg(palette.hotkey);
    let hints = vec![
        Span::styled("[a]", hotkey),
        Span::raw("On/Off "),
        Span::styled("[1-3]", hotkey),
        Span::raw("Toggle "),
        Span::styled("[d]", hotkey),
        Span::raw("Dismiss "),
        Span::styled("[t]", hotkey),
        Span::raw("Test "),
        Span::styled("[h]", hotkey),
        Span::raw("History "),
        Span::styled("[r]", hotkey),
        Span::raw("Reload "),
        Span::styled("[?]", hotkey),
        Span::raw("Help "),
        Span::styled("[q]", hotkey),
        Span::raw("Quit"),
    ];

    let footer = Paragraph::new(Line::from(hints))
        .style(Style::default().fg(palette.text_dim))
        .block(Block::default().borders(Borders::TOP).border_style(Style::default().fg(palette.border)));
    frame.render_widget(footer, area);
}

fn draw_help_overlay(frame: &mut Frame, area: Rect, palette: &Palette) {
    let width = 52.min(area.width.saturating_sub(4));
    let height = 16.min(area.height.saturating_sub(2));
    let overlay = Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    );

    frame.render_widget(Clear, overlay);

    let help_text = "\
VirtualEye Hotkeys

  a        Turn alert notifications on/off
  1 2 3    Toggle motion / human / camera covered
  d        Dismiss the oldest notification
  t        Trigger a test alert
  h        Show/hide alert history
  ↑ ↓      Scroll history
  r        Reload alert settings
  q        Quit
  Ctrl+C   Force quit

Press any key to close this help.";

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(palette.text))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.header))
                .title(Span::styled(
                    " Help ",
                    Style::default().fg(palette.header).add_modifier(Modifier::BOLD),
                )),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(help, overlay);
}
