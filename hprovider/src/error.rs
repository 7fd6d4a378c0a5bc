//! Shared provider error kinds and error value helpers.
//!
//! ```rust
//! use hprovider::ProviderError;
//!
//! let auth = ProviderError::authentication("bad key");
//! assert!(!auth.retryable);
//!
//! let status = ProviderError::status(503, Some("upstream overloaded"));
//! assert!(status.retryable);
//! assert_eq!(status.status, Some(503));
//!
//! let throttled = ProviderError::upstream(400, Some("Throttling.RateQuota"), None);
//! assert!(throttled.retryable);
//! assert_eq!(throttled.code.as_deref(), Some("Throttling.RateQuota"));
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Authentication,
    RateLimited,
    InvalidRequest,
    Timeout,
    Transport,
    Unavailable,
    Protocol,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub retryable: bool,
    pub status: Option<u16>,
    /// DashScope error code, e.g. `Throttling.RateQuota`.
    pub code: Option<String>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
            status: None,
            code: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Authentication, message, false)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RateLimited, message, true)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidRequest, message, false)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message, true)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transport, message, true)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unavailable, message, true)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Protocol, message, false)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, message, false)
    }

    /// Classifies a non-success status reported by the endpoint, either on
    /// the HTTP response itself or inside a streamed envelope.
    pub fn status(status: u16, message: Option<&str>) -> Self {
        let message = match message {
            Some(detail) if !detail.trim().is_empty() => {
                format!("endpoint returned status {status}: {detail}")
            }
            _ => format!("endpoint returned status {status}"),
        };

        let error = match status {
            401 | 403 => Self::authentication(message),
            429 => Self::rate_limited(message),
            408 | 504 => Self::timeout(message),
            400 | 422 => Self::invalid_request(message),
            502 | 503 => Self::unavailable(message),
            _ => Self::transport(message),
        };

        error.with_status(status)
    }

    /// Classifies a DashScope failure from its status and error code. The
    /// code wins over the status: `Throttling*` is retried even when it
    /// arrives as a 400, `InvalidApiKey` is never retried.
    pub fn upstream(status: u16, code: Option<&str>, message: Option<&str>) -> Self {
        let code = code.map(str::trim).filter(|code| !code.is_empty());
        let message = message.map(str::trim).filter(|message| !message.is_empty());
        let detail = match (code, message) {
            (Some(code), Some(message)) => Some(format!("{code}: {message}")),
            (Some(detail), None) | (None, Some(detail)) => Some(detail.to_string()),
            (None, None) => None,
        };

        let error = Self::status(status, detail.as_deref());
        let Some(code) = code else {
            return error;
        };

        let error = if code.starts_with("Throttling") {
            Self {
                kind: ProviderErrorKind::RateLimited,
                retryable: true,
                ..error
            }
        } else if code == "InvalidApiKey" {
            Self {
                kind: ProviderErrorKind::Authentication,
                retryable: false,
                ..error
            }
        } else if code == "DataInspectionFailed" {
            Self {
                kind: ProviderErrorKind::InvalidRequest,
                retryable: false,
                ..error
            }
        } else {
            error
        };

        error.with_code(code)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ProviderError {}
