//! VirtualEye REST API source using reqwest.
//!
//! ## Example
//!
//! ```no_run
//! use virtualeye_client::{AlertSource, HttpAlertSource};
//! use virtualeye_core::ApiConfig;
//!
//! # async fn example() -> virtualeye_client::Result<()> {
//! let source = HttpAlertSource::from_config(&ApiConfig::default())?;
//! source.login("admin@virtualeye.local", "secret").await?;
//!
//! for alert in source.fetch_recent_alerts().await? {
//!     println!("{}", alert.format_compact());
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::RwLock;

use ::async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use virtualeye_core::{Alert, AlertToggleSet, AlertType, ApiConfig};

use crate::error::{ClientError, Result};
use crate::source::AlertSource;
use crate::wire::{
    AlertsEnvelope, HealthStatus, LoginRequest, LoginResponse, TogglesEnvelope, TriggerRequest,
};

/// Alert source backed by the VirtualEye REST API.
///
/// Every request carries `Authorization: Bearer <token>` when a token is
/// set. A 401/403 response clears the stored token: the session is gone and
/// only a new login can restore it.
pub struct HttpAlertSource {
    client: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpAlertSource {
    /// Create a source from API settings; the token is read from
    /// `config.token_env` if set.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(config.token_from_env()),
        })
    }

    /// Create a source with an explicit token.
    pub fn with_token(config: &ApiConfig, token: impl Into<String>) -> Result<Self> {
        let source = Self::from_config(config)?;
        source.set_token(Some(token.into()));
        Ok(source)
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether a session token is currently held.
    pub fn has_token(&self) -> bool {
        self.token
            .read()
            .map(|t| t.is_some())
            .unwrap_or_else(|poisoned| poisoned.into_inner().is_some())
    }

    fn set_token(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    fn current_token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Log in with email and password; the returned token is kept for
    /// subsequent requests.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let response = self
            .request(Method::POST, "auth/login")
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(|e| self.classify_transport(e))?;

        let login: LoginResponse = self.parse(response).await?;
        self.set_token(Some(login.token));
        debug!(email, "logged in");
        Ok(())
    }

    /// Check backend health (`GET health`). Does not require a session.
    pub async fn health(&self) -> Result<HealthStatus> {
        self.get_json("health").await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let mut builder = self
            .client
            .request(method, url)
            .header("accept", "application/json");
        if let Some(token) = self.current_token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!(path, "GET");
        let response = self
            .request(Method::GET, path)
            .send()
            .await
            .map_err(|e| self.classify_transport(e))?;
        self.parse(response).await
    }

    /// Check the status and decode the body.
    async fn parse<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let response = self.check_status(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(ClientError::from)
    }

    async fn check_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ClientError::from_http_status(status.as_u16(), &body);
        if err.is_auth_error() && self.has_token() {
            warn!(status = status.as_u16(), "session rejected, clearing token");
            self.set_token(None);
        }
        Err(err)
    }

    fn classify_transport(&self, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout(e.to_string())
        } else if e.is_connect() {
            ClientError::ConnectionFailed(e.to_string())
        } else {
            ClientError::HttpError(e)
        }
    }
}

#[async_trait]
impl AlertSource for HttpAlertSource {
    async fn fetch_recent_alerts(&self) -> Result<Vec<Alert>> {
        let envelope: AlertsEnvelope = self.get_json("alerts/recent").await?;
        Ok(envelope.alerts)
    }

    async fn fetch_alert_config(&self) -> Result<AlertToggleSet> {
        let envelope: TogglesEnvelope = self.get_json("alerts/config").await?;
        Ok(envelope.toggles)
    }

    async fn update_alert_config(&self, toggles: &AlertToggleSet) -> Result<()> {
        debug!(?toggles, "PUT alerts/config");
        let response = self
            .request(Method::PUT, "alerts/config")
            .json(&TogglesEnvelope { toggles: *toggles })
            .send()
            .await
            .map_err(|e| self.classify_transport(e))?;
        self.check_status(response).await?;
        Ok(())
    }

    async fn trigger_test_alert(&self, alert_type: AlertType, message: &str) -> Result<()> {
        debug!(%alert_type, "POST alerts/trigger");
        let body = TriggerRequest {
            alert_type,
            message: message.to_string(),
            simulated: true,
        };
        let response = self
            .request(Method::POST, "alerts/trigger")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify_transport(e))?;
        self.check_status(response).await?;
        Ok(())
    }

    async fn fetch_alert_history(&self) -> Result<Vec<Alert>> {
        let envelope: AlertsEnvelope = self.get_json("alerts/history").await?;
        Ok(envelope.alerts)
    }

    fn name(&self) -> &str {
        "http"
    }
}
