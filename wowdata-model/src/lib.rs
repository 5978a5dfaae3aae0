//! Entity model for WowData access.
//!
//! Defines the schema-bound data every tier exchanges:
//! - [`VerifyStep`] / [`CleanStep`], named validation and normalization operations
//! - [`Schema`] and [`FieldMeta`], per-entity field tables with query bindings
//! - [`Record`], a container that only ever holds verified, cleaned values
//! - [`EntityType`], the closed set of lookup entity kinds and their schemas
//!
//! Records serialize to self-describing JSON blobs so storage tiers can keep
//! them opaque; rebuilding a record from a blob re-validates every field.

mod entity_type;
mod record;
mod schema;
mod schemas;
pub mod steps;

pub use entity_type::EntityType;
pub use record::Record;
pub use schema::{FieldMeta, FieldOutcome, Schema};
pub use steps::{Arg, CleanOp, CleanStep, VerifyOp, VerifyStep};

/// Result type alias using the model error type.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Errors raised while (de)serializing or naming entities.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown entity type: {0}")]
    UnknownEntity(String),

    #[error("entity mismatch: expected {expected}, found {found}")]
    EntityMismatch {
        expected: EntityType,
        found: EntityType,
    },
}
