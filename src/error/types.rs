//! Core error types.

use thiserror::Error;

/// Result type for request operations.
pub type Result<T> = std::result::Result<T, RequestError>;

/// Coarse classification of a [`RequestError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Explicitly cancelled by the caller.
    Cancelled,
    /// Connection-level failure.
    Network,
    /// The request or connect phase timed out.
    Timeout,
    /// 4xx responses.
    Client,
    /// 5xx responses.
    Server,
    /// Invalid input or client configuration.
    Configuration,
    /// Response body could not be decoded.
    Parsing,
}

/// Errors produced by scoped clients and their transports.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    /// The request's scope was cancelled before it settled.
    #[error("Request cancelled{}", .reason.as_deref().filter(|r| !r.is_empty()).map(|r| format!(": {r}")).unwrap_or_default())]
    Cancelled { reason: Option<String> },

    /// Network or transport failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Request timed out.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Non-success status from a transport that rejects on status.
    #[error("HTTP {status}: {message}")]
    Status {
        status: u16,
        message: String,
        body: String,
    },

    /// URL could not be parsed or joined.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Header name or value is not valid HTTP.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Client configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The transport cannot issue this method.
    #[error("Method {0} is not supported by this transport")]
    UnsupportedMethod(String),

    /// Body decoding error.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl RequestError {
    /// Cancellation error with an optional reason.
    pub fn cancelled(reason: Option<&str>) -> Self {
        Self::Cancelled {
            reason: reason.map(str::to_string),
        }
    }

    /// Status error for a non-success response.
    pub fn status(status: u16, message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
            body: body.into(),
        }
    }

    /// True when this error came from an explicit cancel.
    pub const fn is_cancel(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Cancellation reason, if this is a cancellation with one.
    pub fn cancel_reason(&self) -> Option<&str> {
        match self {
            Self::Cancelled { reason } => reason.as_deref(),
            _ => None,
        }
    }

    /// HTTP status code, if any.
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify the error.
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Cancelled { .. } => ErrorCategory::Cancelled,
            Self::Http(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Status { status, .. } if *status >= 500 => ErrorCategory::Server,
            Self::Status { .. } => ErrorCategory::Client,
            Self::InvalidUrl(_)
            | Self::InvalidHeader(_)
            | Self::Configuration(_)
            | Self::UnsupportedMethod(_) => ErrorCategory::Configuration,
            Self::Decode(_) => ErrorCategory::Parsing,
        }
    }

    /// Whether a transport-level retry could plausibly succeed.
    ///
    /// Informational only: the retry driver retries anything its abort
    /// predicate does not reject.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            _ => false,
        }
    }
}
