//! `stmocli fork <file|query_id> <new_file>`

use anyhow::{Context, Result};
use clap::Args;

use stmo_core::{QueryId, Registry};

use super::{parse_query_id, GlobalArgs};

/// Copy a query on the service and track the copy in a new file.
#[derive(Args, Debug)]
pub struct ForkArgs {
    /// Tracked file or numeric query id to copy.
    pub source: String,

    /// Local file for the copy.
    pub new_file: String,
}

impl ForkArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let mut engine = global.remote_engine()?;
        let source = resolve_source(engine.registry(), &self.source)?;

        let outcome = engine
            .fork(&source, &self.new_file)
            .with_context(|| format!("failed to fork query {source}"))?;

        println!(
            "✓ Forked query {} to query {} in {}",
            source, outcome.record.id, outcome.file
        );
        Ok(())
    }
}

/// A tracked file wins over a numeric id of the same spelling.
fn resolve_source(registry: &Registry, source: &str) -> Result<QueryId> {
    if let Ok(record) = registry.get(source) {
        return Ok(record.id.clone());
    }
    if let Ok(id) = parse_query_id(source) {
        return Ok(id);
    }
    anyhow::bail!("'{source}' is neither a tracked file nor a query id")
}
