//! Error types for the access layer.

use thiserror::Error;

/// Result type for access operations.
pub type AccessResult<T> = Result<T, AccessError>;

/// Errors raised while configuring the access context or shaping requests.
///
/// A lookup miss is never an error; it is a `None` slot.
#[derive(Debug, Error)]
pub enum AccessError {
    /// No channel tier was configured.
    #[error("no channel tiers configured")]
    NoTiers,

    /// Config file could not be read.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for the expected layout.
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config parsed but holds unusable values.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A lookup request that is neither a parameter mapping nor a list of them.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Fatal error raised through [`crate::DataAccess::error`].
    #[error("{message}")]
    Fatal { message: String, code: u16 },
}

impl AccessError {
    /// Numeric status code of the failure.
    pub fn code(&self) -> u16 {
        match self {
            AccessError::Fatal { code, .. } => *code,
            AccessError::InvalidRequest(_) => 400,
            _ => 500,
        }
    }
}
