//! Tiered lookup orchestrator for WowData access.
//!
//! [`DataAccess`] walks an ordered chain of [`wowdata_channel::Tier`]s for
//! each lookup, stops as soon as every parameter group is resolved, and
//! writes the records it found back into the tiers that missed them, so
//! earlier tiers act as caches for later ones.
//!
//! - [`AccessConfig`]: logging switches and parameter defaults (TOML)
//! - [`params`]: parameter table, coercion and realm slugs
//! - [`LookupRequest`] / [`LookupResult`]: single or batch lookups
//! - [`AccessLog`]: buffered or direct diagnostic trail

mod access;
mod config;
mod error;
mod log;
pub mod params;
mod request;

pub use access::{DataAccess, FATAL_CODE};
pub use config::{AccessConfig, Defaults, LoggingConfig};
pub use error::{AccessError, AccessResult};
pub use log::{AccessLog, LogEntry};
pub use request::{LookupRequest, LookupResult};
