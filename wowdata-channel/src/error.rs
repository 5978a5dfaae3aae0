//! Error types for channel tiers.

use thiserror::Error;
use wowdata_model::{EntityType, ModelError};

/// Result type for handler invocations.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Non-fatal failures inside a read or write handler.
///
/// The dispatcher logs these and treats them as a miss (read) or a failed
/// write; they never reach the caller of a lookup.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Filesystem failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record blob could not be restored.
    #[error("record error: {0}")]
    Model(#[from] ModelError),

    /// Database or network backend failure.
    #[error("backend error: {0}")]
    Backend(String),

    /// A parameter needed to address the backend was not supplied.
    #[error("missing parameter: {0}")]
    MissingParam(String),

    /// The backend answered with something that cannot be mapped.
    #[error("unexpected payload: {0}")]
    Payload(String),
}

/// Result type for tier construction.
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// Fatal configuration failures detected while building a tier.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// A mandatory option is absent or empty.
    #[error("option \"{0}\" is mandatory")]
    MissingOption(String),

    /// An option is present but unusable.
    #[error("option \"{option}\" is invalid: {reason}")]
    InvalidOption { option: String, reason: String },

    /// A scheme refers to a field the entity schema does not declare.
    #[error("{entity} does not declare field \"{field}\"")]
    UndeclaredField { entity: EntityType, field: String },

    /// A configured table is absent from the database.
    #[error("table \"{0}\" does not exist")]
    MissingTable(String),

    /// A configured column is absent from its table.
    #[error("column \"{column}\" does not exist in table \"{table}\"")]
    MissingColumn { table: String, column: String },

    /// An enabled entity type has no read handler.
    #[error("tier \"{tier}\" enables {entity} without a read handler")]
    NoHandlers { tier: String, entity: EntityType },

    /// The backend could not be opened or inspected.
    #[error("backend error: {0}")]
    Backend(String),
}

impl RegistrationError {
    /// Numeric status code reported for fatal registration failures.
    pub fn code(&self) -> u16 {
        500
    }
}
