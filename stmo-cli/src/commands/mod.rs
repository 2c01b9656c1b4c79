pub mod fork;
pub mod init;
pub mod list;
pub mod pull;
pub mod push;
pub mod track;
pub mod view;
pub mod write_csv;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;

use stmo_client::{RedashClient, DEFAULT_BASE_URL};
use stmo_core::{QueryId, DEFAULT_REGISTRY_PATH};
use stmo_sync::{Context, Engine};

/// Options shared by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Redash API key used for every service request.
    #[arg(long, env = "REDASH_API_KEY", global = true, hide_env_values = true)]
    pub redash_api_key: Option<String>,

    /// Registry file mapping local files to query ids.
    #[arg(
        long,
        env = "STMOCLI_REGISTRY",
        global = true,
        default_value = DEFAULT_REGISTRY_PATH
    )]
    pub registry: PathBuf,

    /// Service root URL.
    #[arg(
        long,
        env = "STMOCLI_BASE_URL",
        global = true,
        hide = true,
        default_value = DEFAULT_BASE_URL
    )]
    pub base_url: String,
}

impl GlobalArgs {
    pub fn context(&self) -> Context {
        Context::new(self.redash_api_key.clone().unwrap_or_default())
            .with_base_url(&self.base_url)
            .with_registry_path(&self.registry)
    }

    /// Engine over the local registry. Commands that only read the registry
    /// use this one.
    pub fn engine(&self) -> Result<Engine<RedashClient>> {
        tracing::debug!(registry = %self.registry.display(), base_url = %self.base_url, "loading registry");
        Engine::from_context(&self.context())
            .with_context(|| format!("failed to load registry '{}'", self.registry.display()))
    }

    /// Engine for commands that talk to the service; needs an API key.
    pub fn remote_engine(&self) -> Result<Engine<RedashClient>> {
        if self.redash_api_key.as_deref().map_or(true, str::is_empty) {
            anyhow::bail!("no API key; pass --redash-api-key or set REDASH_API_KEY");
        }
        self.engine()
    }
}

/// Parse a numeric query id from the command line.
pub fn parse_query_id(raw: &str) -> std::result::Result<QueryId, String> {
    match QueryId::new(raw) {
        Ok(id) if id.is_numeric() => Ok(id),
        _ => Err(format!("'{raw}' is not a query id; expected digits only")),
    }
}
