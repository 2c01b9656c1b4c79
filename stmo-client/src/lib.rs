//! # stmo-client
//!
//! Remote side of stmo: the [`QueryService`] seam and its implementations.
//!
//! - [`RedashClient`] talks to a Redash instance over HTTP.
//! - [`MemoryService`] keeps queries in process; the sync crate's tests run
//!   against it.
//!
//! Every failure, transport or service-side, comes back as a [`ServiceError`].
//! Nothing here retries.

pub mod error;
pub mod memory;
pub mod redash;
pub mod service;

pub use error::ServiceError;
pub use memory::MemoryService;
pub use redash::{RedashClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use service::{QueryService, QueryUpdate, RemoteQuery, ResultSet};
