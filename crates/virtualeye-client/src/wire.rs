//! Request and response bodies of the VirtualEye REST API.

use serde::{Deserialize, Serialize};
use virtualeye_core::{Alert, AlertToggleSet, AlertType};

/// `{"alerts": [...]}` envelope used by the recent and history endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertsEnvelope {
    #[serde(default)]
    pub alerts: Vec<Alert>,
}

/// `{"toggles": {...}}` envelope used by `GET`/`PUT alerts/config`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TogglesEnvelope {
    pub toggles: AlertToggleSet,
}

/// Body of `POST alerts/trigger`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRequest {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub message: String,
    /// Tags the stored alert so it can be told apart from real detections
    #[serde(default)]
    pub simulated: bool,
}

/// Body of `POST auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Successful `POST auth/login` response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<serde_json::Value>,
}

/// `GET health` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: String,
}

impl HealthStatus {
    /// True when the backend reports `"ok"`.
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}
