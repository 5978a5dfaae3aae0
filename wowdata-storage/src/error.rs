//! Error types for the storage tiers.

use thiserror::Error;
use wowdata_channel::{ChannelError, RegistrationError};

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while opening or querying a storage tier.
#[derive(Debug, Error)]
pub enum StorageError {
    /// SQLite failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Record blob could not be written or restored.
    #[error("record error: {0}")]
    Model(#[from] wowdata_model::ModelError),

    /// Tier options or backend layout are unusable.
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

impl StorageError {
    /// Numeric status code reported when construction fails.
    pub fn code(&self) -> u16 {
        match self {
            StorageError::Registration(e) => e.code(),
            _ => 500,
        }
    }
}

impl From<StorageError> for ChannelError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => ChannelError::Io(e),
            StorageError::Model(e) => ChannelError::Model(e),
            other => ChannelError::Backend(other.to_string()),
        }
    }
}
