//! Client error types.

use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The service answered with an unexpected status.
    #[error("service error {status}: {body}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// The transport failed before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Request or response body could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Empty identifier or malformed base URL.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Status code of a service error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Service { status, .. } => Some(*status),
            _ => None,
        }
    }
}
