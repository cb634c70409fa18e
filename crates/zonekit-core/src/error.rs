//! Error types for zonekit
//!
//! This module defines all error types used throughout the crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for zonekit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Provider error code meaning SSL verification is no longer possible
/// (the CNAME grace period expired).
pub const SSL_UNAVAILABLE_CODE: i64 = 1001;

/// One entry of the `errors` list the provider returns with a failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    /// Provider-defined error code
    pub code: i64,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
}

/// A failed remote call, as reported by the backing service
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteError {
    /// HTTP status, when the failure came with a response
    pub status: Option<u16>,
    /// Structured errors from the response payload
    pub errors: Vec<ApiMessage>,
    /// Summary of the failure
    pub message: String,
}

impl RemoteError {
    /// Create a remote error with only a summary message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            errors: Vec::new(),
            message: message.into(),
        }
    }

    /// Attach the HTTP status
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach one structured error entry
    pub fn with_error(mut self, code: i64, message: impl Into<String>) -> Self {
        self.errors.push(ApiMessage {
            code,
            message: message.into(),
        });
        self
    }

    /// Whether any structured error carries `code`
    pub fn has_code(&self, code: i64) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    /// Whether any structured error message contains `fragment`
    /// (case-insensitive)
    pub fn mentions(&self, fragment: &str) -> bool {
        let fragment = fragment.to_lowercase();
        self.errors
            .iter()
            .any(|e| e.message.to_lowercase().contains(&fragment))
    }
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(status) = self.status {
            write!(f, "HTTP {}: ", status)?;
        }
        write!(f, "{}", self.message)?;
        for e in &self.errors {
            write!(f, " [{}: {}]", e.code, e.message)?;
        }
        Ok(())
    }
}

/// Core error type for zonekit
#[derive(Error, Debug)]
pub enum Error {
    /// Lookup by name or id found nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Read of a field, attribute or setting the resource does not have
    #[error("{resource} has no attribute '{field}'")]
    AttributeNotFound {
        /// Kind of resource that was read
        resource: &'static str,
        /// Requested name
        field: String,
    },

    /// Rejected write or construction request
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backing service call failed
    #[error("Remote service error: {0}")]
    Remote(RemoteError),

    /// SSL verification is no longer available for the zone
    #[error("SSL unavailable: {0}")]
    SslUnavailable(RemoteError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure before any response was received
    #[error("HTTP error: {0}")]
    Http(String),

    /// A response arrived but not in the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File access errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an "attribute not found" error
    pub fn attribute(resource: &'static str, field: impl Into<String>) -> Self {
        Self::AttributeNotFound {
            resource,
            field: field.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP transport error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an invalid response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// The remote failure behind this error, if any
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            Self::Remote(e) | Self::SslUnavailable(e) => Some(e),
            _ => None,
        }
    }

    /// Replace a remote failure carrying `code` with the error built by
    /// `translate`. Every other error is returned unchanged.
    pub fn translate_code(self, code: i64, translate: fn(RemoteError) -> Error) -> Self {
        match self {
            Self::Remote(e) if e.has_code(code) => {
                tracing::warn!("Translating remote error code {}", code);
                translate(e)
            }
            other => other,
        }
    }
}

impl From<RemoteError> for Error {
    fn from(err: RemoteError) -> Self {
        Self::Remote(err)
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

/// Run `op` and translate a remote failure carrying `code` with `translate`.
///
/// All other outcomes, including remote failures with different codes,
/// pass through untouched.
pub fn translate_errors<T>(
    code: i64,
    translate: fn(RemoteError) -> Error,
    op: impl FnOnce() -> Result<T>,
) -> Result<T> {
    op().map_err(|e| e.translate_code(code, translate))
}
