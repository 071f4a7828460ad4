//! Alert domain types shared across VirtualEye crates.
//!
//! Field names follow the backend's JSON (`camelCase`, `_id` for the server
//! id) so the same types serve as wire format and domain model.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Category of a detection event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertType {
    /// Movement detected in frame
    Motion,
    /// A person was detected
    Human,
    /// The camera view is blocked
    CameraCovered,
}

impl AlertType {
    /// All alert types in display order.
    pub const ALL: [AlertType; 3] = [AlertType::Motion, AlertType::Human, AlertType::CameraCovered];

    /// Get a human-readable label for this alert type.
    pub fn label(&self) -> &'static str {
        match self {
            AlertType::Motion => "Motion",
            AlertType::Human => "Human",
            AlertType::CameraCovered => "Camera Covered",
        }
    }

    /// Wire name, as used in JSON and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Motion => "motion",
            AlertType::Human => "human",
            AlertType::CameraCovered => "cameraCovered",
        }
    }

    /// Get the default message for this alert type.
    pub fn default_message(&self) -> &'static str {
        match self {
            AlertType::Motion => "Motion detected",
            AlertType::Human => "Person detected",
            AlertType::CameraCovered => "Camera view obstructed",
        }
    }

    /// Get the icon for this alert type.
    pub fn icon(&self) -> &'static str {
        match self {
            AlertType::Motion => "≋",
            AlertType::Human => "☺",
            AlertType::CameraCovered => "▣",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlertType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlertType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown alert type: {s}"))
    }
}

/// Server-assigned severity level.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertSeverity {
    /// Low severity (default when the server omits it)
    #[default]
    #[serde(alias = "low")]
    Low,
    /// Medium severity
    #[serde(alias = "medium")]
    Medium,
    /// High severity
    #[serde(alias = "high")]
    High,
}

impl AlertSeverity {
    /// Get the display label for this severity.
    pub fn label(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "LOW",
            AlertSeverity::Medium => "MEDIUM",
            AlertSeverity::High => "HIGH",
        }
    }
}

/// Identity of an alert.
///
/// Server ids are preferred; alerts without one are identified by their
/// detection time and their position in the response that delivered them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AlertKey {
    /// Server-assigned id
    Server(String),
    /// `(timestamp, ordinal)` fallback
    Detected(DateTime<Utc>, usize),
}

/// A detection event issued by the alert service.
///
/// Alerts are immutable once created; the `acknowledged` and `dismissed`
/// flags are maintained server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Server id (`_id` on the wire, `id` accepted)
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Alert category
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    /// Free-text description
    #[serde(default)]
    pub message: String,
    /// When the event was detected
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Acknowledged flag (server-side)
    #[serde(default)]
    pub acknowledged: bool,
    /// Dismissed flag (server-side)
    #[serde(default)]
    pub dismissed: bool,
    /// Camera that produced the detection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_id: Option<String>,
    /// Detector confidence in `0.0..=1.0`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Severity level
    #[serde(default)]
    pub severity: AlertSeverity,
    /// True when the alert was fabricated by the auto-simulator
    #[serde(default)]
    pub simulated: bool,
}

impl Alert {
    /// Create a new alert detected now, with no server id.
    pub fn new(alert_type: AlertType, message: impl Into<String>) -> Self {
        Self {
            id: None,
            alert_type,
            message: message.into(),
            timestamp: Utc::now(),
            acknowledged: false,
            dismissed: false,
            camera_id: None,
            confidence: None,
            severity: AlertSeverity::default(),
            simulated: false,
        }
    }

    /// Set the server id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the detection timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the severity.
    pub fn with_severity(mut self, severity: AlertSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Mark the alert as simulated.
    pub fn simulated(mut self) -> Self {
        self.simulated = true;
        self
    }

    /// Identity of this alert given its position in the delivering response.
    pub fn key(&self, ordinal: usize) -> AlertKey {
        match &self.id {
            Some(id) => AlertKey::Server(id.clone()),
            None => AlertKey::Detected(self.timestamp, ordinal),
        }
    }

    /// Format for display in one line.
    pub fn format_compact(&self) -> String {
        let sim_marker = if self.simulated { " [sim]" } else { "" };
        format!(
            "{} {}: {}{}",
            self.alert_type.icon(),
            self.alert_type.label(),
            self.message,
            sim_marker
        )
    }

    /// Format for the history list.
    pub fn format_detail(&self) -> String {
        let time = self.timestamp.format("%Y-%m-%d %H:%M:%S");
        let confidence = match self.confidence {
            Some(c) => format!(" ({:.1}%)", c * 100.0),
            None => String::new(),
        };
        let camera = self
            .camera_id
            .as_deref()
            .map(|c| format!(" [{c}]"))
            .unwrap_or_default();
        format!(
            "[{}] {:<6} {}{}{} - {}",
            time,
            self.severity.label(),
            self.alert_type.label(),
            camera,
            confidence,
            self.message
        )
    }
}

/// Parse a detection timestamp as the backend emits it.
///
/// Accepted: RFC 3339, RFC 2822 / HTTP dates (`Fri, 16 Oct 2026 08:30:00
/// GMT`), and ISO 8601 without an offset, which is taken as UTC.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_rfc2822(value) {
        return Some(t.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|t| t.and_utc())
}

/// Seconds since the Unix epoch, fractional part kept to the nanosecond.
fn timestamp_from_epoch(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Text(String),
        Epoch(f64),
    }

    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Text(text) => parse_timestamp(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {text}"))),
        RawTimestamp::Epoch(secs) => timestamp_from_epoch(secs)
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {secs}"))),
    }
}

/// Which alert categories are enabled.
///
/// The remote config service owns the source of truth; clients hold a cached
/// copy. The default has every category disabled, so nothing is simulated
/// before the real configuration has been loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertToggleSet {
    /// Motion alerts enabled
    #[serde(default)]
    pub motion: bool,
    /// Human alerts enabled
    #[serde(default)]
    pub human: bool,
    /// Camera-covered alerts enabled
    #[serde(default)]
    pub camera_covered: bool,
}

impl AlertToggleSet {
    /// A toggle set with every category enabled.
    pub fn all_enabled() -> Self {
        Self {
            motion: true,
            human: true,
            camera_covered: true,
        }
    }

    /// Whether `alert_type` is enabled.
    pub fn get(&self, alert_type: AlertType) -> bool {
        match alert_type {
            AlertType::Motion => self.motion,
            AlertType::Human => self.human,
            AlertType::CameraCovered => self.camera_covered,
        }
    }

    /// Set the enabled state of `alert_type`.
    pub fn set(&mut self, alert_type: AlertType, enabled: bool) {
        match alert_type {
            AlertType::Motion => self.motion = enabled,
            AlertType::Human => self.human = enabled,
            AlertType::CameraCovered => self.camera_covered = enabled,
        }
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, alert_type: AlertType, enabled: bool) -> Self {
        self.set(alert_type, enabled);
        self
    }

    /// Enabled categories in display order.
    pub fn enabled_types(&self) -> Vec<AlertType> {
        AlertType::ALL.into_iter().filter(|t| self.get(*t)).collect()
    }

    /// True if at least one category is enabled.
    pub fn any_enabled(&self) -> bool {
        AlertType::ALL.iter().any(|t| self.get(*t))
    }
}
