//! Error types for huddle-api

use thiserror::Error;

/// Result type alias using huddle-api Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the chat backend
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed (connection refused, DNS, timeout, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("Backend returned status {status}")]
    Status { status: u16, body: String },

    /// Body was not JSON or did not carry a `response` string
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Invalid configuration (bad base URL, header value, ...)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a status error from a code and the raw body
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Check if this failure looks transient (worth mentioning in logs).
    ///
    /// This only feeds diagnostics. Every failure produces the same
    /// user-visible outcome.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Error::Status { status, .. } => {
                *status == 408 || *status == 429 || (500..600).contains(status)
            }
            Error::MalformedResponse(_) | Error::InvalidConfig(_) => false,
        }
    }

    /// Short class label used as a structured logging field
    pub fn class(&self) -> &'static str {
        match self {
            Error::Http(_) => "network",
            Error::Status { .. } => "status",
            Error::MalformedResponse(_) => "malformed",
            Error::InvalidConfig(_) => "config",
        }
    }
}
