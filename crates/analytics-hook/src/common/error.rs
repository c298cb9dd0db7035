//! Common Error Types
//!
//! Unified error handling with a coarse error-kind mapping so callers can tell
//! missing setup apart from upstream failures.

use std::time::Duration;

/// Error classes a calling task cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed setup. Never retried.
    Configuration,
    /// Failure surfaced by the HTTP layer or the Google API.
    Transport,
    /// The configured pagination bound was reached.
    Pagination,
}

/// Hook error type
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("No valid credentials could be found")]
    NoCredentials,

    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid credentials: {0}")]
    Credentials(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Google API error {code}: {message}")]
    Api { code: u16, message: String },

    #[error("Rate limited by Google API")]
    RateLimited,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Pagination exceeded after {pages} pages ({elapsed:?})")]
    PaginationExceeded { pages: usize, elapsed: Duration },
}

impl AnalyticsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalyticsError::NoCredentials
            | AnalyticsError::UnknownService(_)
            | AnalyticsError::ConnectionNotFound(_)
            | AnalyticsError::Config(_)
            | AnalyticsError::Credentials(_) => ErrorKind::Configuration,
            AnalyticsError::TokenExchange(_)
            | AnalyticsError::Http(_)
            | AnalyticsError::Api { .. }
            | AnalyticsError::RateLimited
            | AnalyticsError::Json(_)
            | AnalyticsError::UnexpectedResponse(_) => ErrorKind::Transport,
            AnalyticsError::PaginationExceeded { .. } => ErrorKind::Pagination,
        }
    }

    /// True for setup problems that no amount of retrying will fix
    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}
