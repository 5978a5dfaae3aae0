//! Core value types for WowData access.
//!
//! This crate defines the loosely-typed data that flows between callers,
//! backend tiers and entity schemas:
//! - [`Value`], the dynamic value sum type
//! - [`ParamGroup`], the ordered query-parameter mapping used as a lookup key
//! - loose coercions (integer, float, text, truthiness, loose equality)
//! - wall clock helpers for record timestamps and lifetimes
//!
//! Nothing here knows about entity types; schemas live in `wowdata-model`.

mod coerce;
mod timestamp;
mod value;

pub use timestamp::{is_fresh, unix_now};
pub use value::{ParamGroup, Value};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in value operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
