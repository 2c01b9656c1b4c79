//! `stmocli track <query_id> [file]`

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use stmo_core::QueryId;
use stmo_sync::FileName;

use super::{parse_query_id, GlobalArgs};

/// Fetch a query and start tracking it in a local file.
#[derive(Args, Debug)]
pub struct TrackArgs {
    /// Id of the remote query.
    #[arg(value_parser = parse_query_id)]
    pub query_id: QueryId,

    /// Local file to write; prompted for when omitted.
    pub file: Option<String>,
}

impl TrackArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let mut engine = global.remote_engine()?;

        let mut ask = prompt_file_name;
        let file_name = match self.file {
            Some(file) => FileName::Fixed(file),
            None => FileName::Prompt(&mut ask),
        };

        let outcome = engine
            .track(&self.query_id, file_name)
            .with_context(|| format!("failed to track query {}", self.query_id))?;

        if let Some(existing) = &outcome.conflict {
            eprintln!(
                "{} '{}' is already tracked as query {}; registry entry kept",
                "warning:".yellow().bold(),
                outcome.file,
                existing.id
            );
        }
        println!(
            "✓ Tracking query {} ({}) in {}",
            outcome.record.id, outcome.record.name, outcome.file
        );
        Ok(())
    }
}

/// Ask on stdin; end of input counts as accepting the default.
fn prompt_file_name(default: &str) -> io::Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "File name [{default}]: ")?;
    stdout.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer)
}
