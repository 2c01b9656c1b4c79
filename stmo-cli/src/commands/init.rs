//! `stmocli init`

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use stmo_core::Registry;

use super::GlobalArgs;

/// Create an empty registry; an existing one is left untouched.
#[derive(Args, Debug)]
pub struct InitArgs {}

impl InitArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let path = &global.registry;
        let created = Registry::initialize_at(path)
            .with_context(|| format!("failed to initialize '{}'", path.display()))?;

        if created {
            println!("✓ Initialized {}", path.display());
        } else {
            println!(
                "{} {} already exists; left untouched",
                "·".dimmed(),
                path.display()
            );
        }
        Ok(())
    }
}
