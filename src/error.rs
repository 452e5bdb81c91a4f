//! Error types for varanno
//!
//! Every failure a lookup can produce is one of a small set of kinds. The
//! cache layer decides cacheability per kind (transient failures are never
//! cached, permanent ones are negative-cached briefly); the front ends map
//! kinds to TSV failure rows or HTTP statuses without ever inspecting
//! HTTP-level detail themselves.

use thiserror::Error;

/// Main error type for varanno operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnoError {
    /// Input was empty, whitespace-only, or rejected by the provider as
    /// unprocessable (non-404 4xx).
    #[error("Invalid input: {msg}")]
    InvalidInput { msg: String },

    /// The provider has no annotation for this variant.
    #[error("No annotation found for {variant}")]
    NotFound { variant: String },

    /// The provider call exceeded its per-call timeout.
    #[error("Provider request timed out")]
    Timeout,

    /// The provider asked us to back off (HTTP 429).
    #[error("Provider rate limit exceeded")]
    RateLimited,

    /// Connection-level failure or provider-side error (5xx).
    #[error("Provider unavailable: {msg}")]
    Unavailable { msg: String },

    /// The provider returned data this system cannot interpret.
    #[error("Malformed provider response: {msg}")]
    MalformedResponse { msg: String },

    /// File IO error (batch front end).
    #[error("IO error: {msg}")]
    Io { msg: String },

    /// Configuration error.
    #[error("Configuration error: {msg}")]
    Config { msg: String },
}

impl AnnoError {
    /// Shorthand for an invalid-input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        AnnoError::InvalidInput { msg: msg.into() }
    }

    /// Shorthand for a malformed-response error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        AnnoError::MalformedResponse { msg: msg.into() }
    }

    /// True for failures that may succeed on a retry. The cache never stores
    /// these; the next `get` for the same key starts a fresh attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AnnoError::Timeout | AnnoError::RateLimited | AnnoError::Unavailable { .. }
        )
    }

    /// Stable machine-readable kind name, used in TSV failure rows and JSON
    /// error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AnnoError::InvalidInput { .. } => "invalid_input",
            AnnoError::NotFound { .. } => "not_found",
            AnnoError::Timeout => "timeout",
            AnnoError::RateLimited => "rate_limited",
            AnnoError::Unavailable { .. } => "unavailable",
            AnnoError::MalformedResponse { .. } => "malformed_response",
            AnnoError::Io { .. } => "io_error",
            AnnoError::Config { .. } => "config_error",
        }
    }
}

impl From<std::io::Error> for AnnoError {
    fn from(err: std::io::Error) -> Self {
        AnnoError::Io {
            msg: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AnnoError {
    fn from(err: serde_json::Error) -> Self {
        AnnoError::MalformedResponse {
            msg: err.to_string(),
        }
    }
}
