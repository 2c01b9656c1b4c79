//! stmo core library: query metadata types and registry persistence.
//!
//! - [`types`]: [`QueryId`] and [`QueryRecord`]
//! - [`error`]: [`RegistryError`], [`RecordError`]
//! - [`registry`]: the file-backed [`Registry`]

pub mod error;
pub mod registry;
pub mod types;

pub use error::{RecordError, RegistryError};
pub use registry::{AddOutcome, Registry, DEFAULT_REGISTRY_PATH};
pub use types::{QueryId, QueryRecord};
