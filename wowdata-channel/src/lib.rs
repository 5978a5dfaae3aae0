//! Channel tier contract for WowData access.
//!
//! A channel is one backend tier (filesystem cache, SQL store, remote API).
//! It declares which entity types it serves and registers read and write
//! handlers for them:
//! - [`Registration`], the per-channel scheme and handler table with dispatch
//! - [`ReadHandler`] / [`WriteHandler`], single-group or batch handlers
//! - [`Tier`], the object-safe surface the lookup orchestrator walks
//! - [`ChannelError`] (non-fatal, logged as a miss) and
//!   [`RegistrationError`] (fatal, aborts startup)

mod error;
mod registration;
pub mod template;
mod tier;

pub use error::{ChannelError, ChannelResult, RegistrationError, RegistrationResult};
pub use registration::{
    Mode, ReadHandler, Registration, WriteHandler, unique_groups, unique_records,
};
pub use tier::{Handled, Request, Response, Tier};
