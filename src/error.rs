//! Error taxonomy for the client.

use thiserror::Error;

/// Errors returned by client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller-supplied data violates a contract. Raised before any I/O.
    #[error("validation error: {0}")]
    Validation(String),

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// A payload, label or response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The subscription handle already has an open listener session.
    #[error("subscription {0} already has an active listener")]
    AlreadyListening(String),
}

impl Error {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Returns true if the service reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Service { status: 404, .. })
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Self::Decode(format!("invalid base64 payload: {err}"))
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
