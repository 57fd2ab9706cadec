//! Error types for the SDK core.
//!
//! # Design
//! The remote API signals four kinds of failure: rejected credentials
//! (`Unauthorized`), remote faults (`Server`), bodies that cannot be read
//! (`Response`) and everything else (`Error`). Transport failures that never
//! produced a status code are kept apart in `Transport` but belong to the
//! generic kind. Nothing here is retried or reclassified after the fact.

use thiserror::Error;

/// Boxed error raised by a caller-supplied cast factory.
pub type CastError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by `Service` calls and the response caster.
#[derive(Debug, Error)]
pub enum SdkError {
    /// The server returned 401 or 403.
    #[error("unauthorized (HTTP {status}): {body}")]
    Unauthorized { status: u16, body: String },

    /// The server returned a 5xx status.
    #[error("server error (HTTP {status}): {body}")]
    Server { status: u16, body: String },

    /// The response body was malformed or had an unexpected shape.
    #[error("invalid response: {0}")]
    Response(String),

    /// The server returned a non-2xx status not covered above.
    #[error("HTTP {status}: {body}")]
    Error { status: u16, body: String },

    /// The request never completed (connect failure, bad proxy, I/O).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The request parameters could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A cast factory rejected a record.
    #[error(transparent)]
    Cast(CastError),
}

impl SdkError {
    /// Wrap a factory error, keeping it downcastable to its own type.
    pub fn cast(err: impl Into<CastError>) -> Self {
        SdkError::Cast(err.into())
    }

    /// Status code carried by the error, when the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            SdkError::Unauthorized { status, .. }
            | SdkError::Server { status, .. }
            | SdkError::Error { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Map a non-2xx status and body to the matching error kind.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => SdkError::Unauthorized { status, body },
            500..=599 => SdkError::Server { status, body },
            _ => SdkError::Error { status, body },
        }
    }
}
