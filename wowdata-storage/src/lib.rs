//! Local storage tiers for WowData access.
//!
//! - [`FilesystemChannel`]: one file per entity below a base directory
//! - [`SqliteChannel`]: one table per entity type in a SQLite database
//!
//! Both implement [`wowdata_channel::Tier`] and expire entries after the
//! lifetime configured for their entity type.

mod error;
mod filesystem;
mod sqlite;

pub use error::{StorageError, StorageResult};
pub use filesystem::{FileScheme, FilesystemChannel, FilesystemOptions, default_file_schemes};
pub use sqlite::{
    SqlField, SqlLifetime, SqlScheme, SqliteChannel, SqliteOptions, default_sql_schemes,
};
