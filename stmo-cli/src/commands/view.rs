//! `stmocli view <file>`

use anyhow::{Context, Result};
use clap::Args;

use super::GlobalArgs;

/// Print the web URL of a tracked query.
#[derive(Args, Debug)]
pub struct ViewArgs {
    /// Tracked file.
    pub file: String,
}

impl ViewArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let engine = global.engine()?;
        let url = engine
            .url_for(&self.file)
            .with_context(|| format!("cannot view '{}'", self.file))?;
        println!("{url}");
        Ok(())
    }
}
