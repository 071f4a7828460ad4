//! Error types for the alert service client.

use thiserror::Error;

/// Alert service client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Session missing, expired or rejected (401/403)
    #[error("Not authenticated: {0}")]
    Unauthorized(String),

    /// API request failed (transient, retryable)
    #[error("API request failed (transient): {0}")]
    ApiTransientError(String),

    /// API request failed (permanent)
    #[error("API request failed: {0}")]
    ApiError(String),

    /// Network timeout
    #[error("Network timeout: {0}")]
    Timeout(String),

    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Client configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl ClientError {
    /// Check if this error is retryable (transient network/API issues).
    ///
    /// Background tasks do not retry by themselves; a retryable error simply
    /// means the next regular tick has a fair chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::ApiTransientError(_)
            | ClientError::Timeout(_)
            | ClientError::ConnectionFailed(_) => true,
            ClientError::HttpError(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Check if this error is a network-related error.
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            ClientError::ApiTransientError(_)
                | ClientError::Timeout(_)
                | ClientError::ConnectionFailed(_)
                | ClientError::HttpError(_)
        )
    }

    /// Check if this error means the session is not (or no longer) valid.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }

    /// One-line message suitable for an inline error banner.
    pub fn friendly_message(&self) -> String {
        match self {
            ClientError::Unauthorized(_) => "Session expired. Please log in again.".to_string(),
            ClientError::ApiTransientError(_) => {
                "The alert service is temporarily unavailable. Please try again.".to_string()
            }
            ClientError::Timeout(_) => "Request timed out. Check your connection.".to_string(),
            ClientError::ConnectionFailed(_) => {
                "Could not reach the alert service. Check your network.".to_string()
            }
            ClientError::HttpError(e) if e.is_timeout() => {
                "Request timed out. Check your connection.".to_string()
            }
            ClientError::HttpError(e) if e.is_connect() => {
                "Could not reach the alert service. Check your network.".to_string()
            }
            ClientError::ApiError(msg) => msg.clone(),
            ClientError::ConfigError(msg) => format!("Configuration error: {}", msg),
            _ => format!("Error: {}", self),
        }
    }

    /// Classify an HTTP status code into appropriate error type.
    ///
    /// `body` is the raw response body; when it carries the backend's
    /// `{"message": ...}` envelope that message is used.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        let message = extract_message(body);
        match status {
            401 | 403 => ClientError::Unauthorized(format!("HTTP {}: {}", status, message)),
            408 => ClientError::Timeout(message),
            429 | 500 | 502 | 503 | 504 => {
                ClientError::ApiTransientError(format!("Server error ({}): {}", status, message))
            }
            _ => ClientError::ApiError(format!("HTTP {}: {}", status, message)),
        }
    }
}

fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
