//! Error types for the remote API tier.

use thiserror::Error;
use wowdata_channel::{ChannelError, RegistrationError};

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors that can occur while talking to the remote API.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport failure (connect, timeout, body).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    /// Payload is not the expected JSON document.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL could not be built from the scheme and parameters.
    #[error("url error: {0}")]
    Url(String),

    /// Request signing failed.
    #[error("signing error: {0}")]
    Signing(String),

    /// Tier options are unusable.
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

impl RemoteError {
    /// Numeric status code reported when construction fails.
    pub fn code(&self) -> u16 {
        match self {
            RemoteError::Registration(e) => e.code(),
            _ => 500,
        }
    }
}

impl From<RemoteError> for ChannelError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Json(e) => ChannelError::Serialization(e),
            other => ChannelError::Backend(other.to_string()),
        }
    }
}
