//! Error types for stmo-sync.

use std::path::PathBuf;

use thiserror::Error;

use stmo_client::ServiceError;
use stmo_core::RegistryError;

/// All errors that can arise from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote service rejected the call or could not be reached.
    #[error("{0}")]
    Service(#[from] ServiceError),

    /// An error from the registry.
    #[error("{0}")]
    Registry(#[from] RegistryError),

    /// An I/O error on a tracked file, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The interactive file-name prompt failed.
    #[error("failed to read file name: {0}")]
    Prompt(#[source] std::io::Error),
}

/// Coarse classification of a [`SyncError`], for callers that react
/// differently to each class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Remote rejection or transport failure. Recoverable per item.
    Service,
    /// The file identifier is not tracked.
    NotFound,
    /// Registry or tracked-file I/O failed.
    Storage,
    /// The registry exists but cannot be trusted. Never reset it.
    Corruption,
    /// Bad interactive input.
    Input,
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Service(_) => ErrorKind::Service,
            SyncError::Registry(RegistryError::NotFound { .. }) => ErrorKind::NotFound,
            SyncError::Registry(RegistryError::Parse { .. }) => ErrorKind::Corruption,
            SyncError::Registry(RegistryError::Io { .. })
            | SyncError::Registry(RegistryError::Serialize(_))
            | SyncError::Io { .. } => ErrorKind::Storage,
            SyncError::Prompt(_) => ErrorKind::Input,
        }
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
