//! Error types for stmo-core.

use std::path::PathBuf;

use thiserror::Error;

/// A query record that cannot exist: the service or the store handed us
/// metadata without a usable id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("query id is missing")]
    MissingId,

    #[error("query id must not be empty")]
    EmptyId,
}

/// All errors that can arise from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Underlying I/O failure on the backing store (permission denied, disk full, ...).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing store exists but is not a valid registry document.
    #[error("failed to parse registry at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization error (save path).
    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The file identifier has no entry in the registry.
    #[error("no such query tracked under '{file}'; maybe you need to track it first")]
    NotFound { file: String },
}

/// Convenience constructor for [`RegistryError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RegistryError {
    RegistryError::Io {
        path: path.into(),
        source,
    }
}
