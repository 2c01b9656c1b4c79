//! Per-invocation configuration.
//!
//! Built once by the caller and handed to [`Engine::from_context`]; nothing
//! in the engine reads the environment or any other global state.
//!
//! [`Engine::from_context`]: crate::Engine::from_context

use std::path::PathBuf;
use std::time::Duration;

use stmo_client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use stmo_core::DEFAULT_REGISTRY_PATH;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    /// Pre-obtained service credential.
    pub api_key: String,
    /// Service root, without the `/api` suffix.
    pub base_url: String,
    /// Registry backing store; relative paths are taken from `workdir`.
    pub registry_path: PathBuf,
    /// Directory relative file identifiers are resolved against.
    pub workdir: PathBuf,
    pub timeout: Duration,
}

impl Context {
    /// Defaults for everything but the credential: the public service, the
    /// registry in the current directory.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            registry_path: PathBuf::from(DEFAULT_REGISTRY_PATH),
            workdir: PathBuf::from("."),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_registry_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.registry_path = path.into();
        self
    }

    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = workdir.into();
        self
    }
}
