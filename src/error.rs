//! Unified client error model.
//! Every failure a view can observe is one of these variants; views decide how to surface
//! them (inline message, forced logout) through the helper queries below.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    /// Bad credentials on login. Shown inline on the login form; no session change.
    #[error("{code}: {message}")]
    Authentication { code: String, message: String },
    /// A 401 observed on any call after login. The session is already cleared when this surfaces.
    #[error("{code}: {message}")]
    AuthorizationExpired { code: String, message: String },
    /// Missing or malformed form input, rejected before any request is sent.
    #[error("{code}: {message}")]
    Validation { code: String, message: String },
    /// Connection refused, DNS, TLS or timeout. Propagated unchanged; never retried here.
    #[error("{code}: {message}")]
    Network { code: String, message: String },
    /// Non-success status other than 401.
    #[error("{code}: {message}")]
    Server { code: String, message: String, status: u16 },
    /// The response body did not have the expected shape.
    #[error("{code}: {message}")]
    Decode { code: String, message: String },
    #[error("{code}: {message}")]
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::Authentication { code, .. }
            | AppError::AuthorizationExpired { code, .. }
            | AppError::Validation { code, .. }
            | AppError::Network { code, .. }
            | AppError::Server { code, .. }
            | AppError::Decode { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Authentication { message, .. }
            | AppError::AuthorizationExpired { message, .. }
            | AppError::Validation { message, .. }
            | AppError::Network { message, .. }
            | AppError::Server { message, .. }
            | AppError::Decode { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn authentication<S: Into<String>>(code: S, msg: S) -> Self { AppError::Authentication { code: code.into(), message: msg.into() } }
    pub fn expired<S: Into<String>>(code: S, msg: S) -> Self { AppError::AuthorizationExpired { code: code.into(), message: msg.into() } }
    pub fn validation<S: Into<String>>(code: S, msg: S) -> Self { AppError::Validation { code: code.into(), message: msg.into() } }
    pub fn network<S: Into<String>>(code: S, msg: S) -> Self { AppError::Network { code: code.into(), message: msg.into() } }
    pub fn server<S: Into<String>>(code: S, msg: S, status: u16) -> Self { AppError::Server { code: code.into(), message: msg.into(), status } }
    pub fn decode<S: Into<String>>(code: S, msg: S) -> Self { AppError::Decode { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// HTTP status this failure corresponds to, when it came from (or stands in for) a response.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            AppError::Authentication { .. } => Some(401),
            AppError::AuthorizationExpired { .. } => Some(401),
            AppError::Validation { .. } => Some(400),
            AppError::Server { status, .. } => Some(*status),
            AppError::Decode { .. } => Some(502),
            AppError::Network { .. } | AppError::Internal { .. } => None,
        }
    }

    /// Only an expired authorization ends the session; every other failure leaves state alone.
    pub fn clears_session(&self) -> bool {
        matches!(self, AppError::AuthorizationExpired { .. })
    }

    /// Whether a manual retry control makes sense. Nothing in the crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Network { .. } | AppError::Server { .. } | AppError::Decode { .. })
    }

    /// Text for an inline, dismissible message.
    pub fn user_message(&self) -> String {
        match self {
            AppError::AuthorizationExpired { .. } => "Your session has expired. Please log in again.".to_string(),
            AppError::Network { .. } => format!("Network error: {}", self.message()),
            _ => self.message().to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            AppError::Network { code: "timeout".into(), message }
        } else if err.is_decode() {
            AppError::Decode { code: "decode_error".into(), message }
        } else {
            AppError::Network { code: "network_error".into(), message }
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal { code: "io_error".into(), message: err.to_string() }
    }
}
