//! `stmocli push [file...]`

use anyhow::Result;
use clap::Args;

use super::GlobalArgs;

/// Upload local SQL for the named files, or for every tracked file.
#[derive(Args, Debug)]
pub struct PushArgs {
    /// Tracked files to push; all tracked files when omitted.
    pub files: Vec<String>,
}

impl PushArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let engine = global.remote_engine()?;
        let items = engine.push_many(&self.files);

        if items.is_empty() {
            println!("No queries tracked. Run `stmocli track <query_id>` first.");
            return Ok(());
        }

        let mut failed = 0usize;
        for item in &items {
            match &item.result {
                Ok(outcome) => println!(
                    "Query ID {} updated with content from {} (md5 {})",
                    outcome.record.id, outcome.file, outcome.checksum
                ),
                Err(err) => {
                    failed += 1;
                    eprintln!("Failed to update query from {}: {}", item.file, err);
                }
            }
        }

        if failed > 0 {
            anyhow::bail!("{failed} of {} pushes failed", items.len());
        }
        Ok(())
    }
}
