//! # stmo-sync
//!
//! Synchronization engine between tracked SQL files and remote queries.
//!
//! Build an [`Engine`] from a [`Context`] and call [`Engine::track`],
//! [`Engine::pull`], [`Engine::push`] / [`Engine::push_many`] or
//! [`Engine::fork`]. All business rules live here; the CLI only formats.

pub mod checksum;
pub mod context;
pub mod engine;
pub mod error;
pub mod stub;
mod writer;

pub use checksum::checksum;
pub use context::Context;
pub use engine::{Engine, FileName, PullOutcome, PushItem, PushOutcome, QueryResults, TrackOutcome};
pub use error::{ErrorKind, SyncError};
pub use stub::{default_file_name, stub};
