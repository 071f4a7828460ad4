//! Configuration for VirtualEye.
//!
//! Loaded from `~/.virtualeye/config.yaml` (or `--config <FILE>`). A missing
//! default file is not an error: every field has a default, so a fresh
//! install runs against `http://localhost:5000/api` with the simulator off.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EyeError, Result};
use crate::logging::virtualeye_home;

/// Default poll interval for `GET alerts/recent` (3 seconds).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;

/// Default visible lifetime of a toast (5 seconds).
pub const DEFAULT_TOAST_LIFETIME_MS: u64 = 5_000;

/// Default auto-simulator interval (15 seconds).
pub const DEFAULT_SIMULATOR_INTERVAL_MS: u64 = 15_000;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend API settings
    pub api: ApiConfig,
    /// Alert monitor settings
    pub monitor: MonitorConfig,
}

/// Backend API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST API, including the `/api` prefix
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Environment variable holding the bearer token
    pub token_env: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout_secs: 10,
            token_env: "VIRTUALEYE_TOKEN".to_string(),
        }
    }
}

impl ApiConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Read the bearer token from the configured environment variable.
    pub fn token_from_env(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Alert monitor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Interval between recent-alert polls in milliseconds
    pub poll_interval_ms: u64,
    /// Visible lifetime of each toast in milliseconds
    pub toast_lifetime_ms: u64,
    /// Initial state of the alerts on/off control
    pub display_enabled: bool,
    /// Auto-simulator settings
    pub simulator: SimulatorConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            toast_lifetime_ms: DEFAULT_TOAST_LIFETIME_MS,
            display_enabled: true,
            simulator: SimulatorConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Toast lifetime as a [`Duration`].
    pub fn toast_lifetime(&self) -> Duration {
        Duration::from_millis(self.toast_lifetime_ms)
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the toast lifetime.
    pub fn with_toast_lifetime(mut self, lifetime: Duration) -> Self {
        self.toast_lifetime_ms = lifetime.as_millis() as u64;
        self
    }

    /// Enable or disable the auto-simulator.
    pub fn with_simulator(mut self, enabled: bool) -> Self {
        self.simulator.enabled = enabled;
        self
    }

    /// Set the auto-simulator interval.
    pub fn with_simulator_interval(mut self, interval: Duration) -> Self {
        self.simulator.interval_ms = interval.as_millis() as u64;
        self
    }
}

/// Auto-simulator settings.
///
/// Off by default: simulated alerts are stored server-side like real ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Whether the simulator runs
    pub enabled: bool,
    /// Interval between simulated alerts in milliseconds
    pub interval_ms: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: DEFAULT_SIMULATOR_INTERVAL_MS,
        }
    }
}

impl SimulatorConfig {
    /// Simulator interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Config {
    /// Default configuration file path (`~/.virtualeye/config.yaml`).
    pub fn default_path() -> Result<PathBuf> {
        Ok(virtualeye_home()?.join("config.yaml"))
    }

    /// Load configuration.
    ///
    /// With an explicit `path` the file must exist. Without one, the default
    /// path is used and a missing file yields [`Config::default`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_path()?, false),
        };

        if !path.exists() {
            if required {
                return Err(EyeError::config_not_found(path));
            }
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| EyeError::io("reading config", &path, e))?;
        let config = Self::from_yaml(&content).map_err(|e| match e {
            EyeError::ConfigInvalid { message, .. } => EyeError::ConfigInvalid {
                path: path.clone(),
                message,
            },
            other => other,
        })?;

        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Parse and validate configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content).map_err(|e| EyeError::ConfigInvalid {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://")) {
            return Err(EyeError::config_validation(format!(
                "api.base_url must be an http(s) URL, got '{}'",
                self.api.base_url
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(EyeError::config_validation("api.timeout_secs must be > 0"));
        }
        if self.monitor.poll_interval_ms == 0 {
            return Err(EyeError::config_validation("monitor.poll_interval_ms must be > 0"));
        }
        if self.monitor.toast_lifetime_ms == 0 {
            return Err(EyeError::config_validation("monitor.toast_lifetime_ms must be > 0"));
        }
        if self.monitor.simulator.interval_ms == 0 {
            return Err(EyeError::config_validation(
                "monitor.simulator.interval_ms must be > 0",
            ));
        }
        Ok(())
    }
}
