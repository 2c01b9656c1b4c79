//! `stmocli pull <file>`

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use super::GlobalArgs;

/// Replace a tracked file with the remote SQL.
#[derive(Args, Debug)]
pub struct PullArgs {
    /// Tracked file to refresh.
    pub file: String,
}

impl PullArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let mut engine = global.remote_engine()?;
        let outcome = engine
            .pull(&self.file)
            .with_context(|| format!("failed to pull '{}'", self.file))?;

        if outcome.overwrote_local {
            eprintln!(
                "{} local changes in '{}' were overwritten",
                "warning:".yellow().bold(),
                outcome.file
            );
        }
        println!("✓ Pulled query {} into {}", outcome.record.id, outcome.file);
        Ok(())
    }
}
