//! Remote API tier for WowData access.
//!
//! [`ApiChannel`] turns parameter groups into request URLs, optionally signs
//! them, fetches the payload through a [`Transport`] and maps it onto
//! records. It never stores anything.

mod channel;
mod error;
mod options;
pub mod signing;
mod transport;
pub mod url;

pub use channel::ApiChannel;
pub use error::{RemoteError, RemoteResult};
pub use options::{
    AuthOptions, REGION_ORDER, RemoteOptions, RemoteScheme, UrlParam, default_base_paths,
    default_remote_schemes,
};
pub use transport::{HttpTransport, Transport};
