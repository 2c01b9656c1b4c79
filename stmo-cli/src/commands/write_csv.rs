//! `stmocli write_csv <query_id> [file|-]`

use std::io;

use anyhow::{Context, Result};
use clap::Args;

use stmo_client::ResultSet;
use stmo_core::QueryId;
use stmo_sync::stub;

use super::{parse_query_id, GlobalArgs};

/// Write the cached result set of a query as CSV.
#[derive(Args, Debug)]
pub struct WriteCsvArgs {
    /// Id of the remote query; it need not be tracked.
    #[arg(value_parser = parse_query_id)]
    pub query_id: QueryId,

    /// Output file, `-` for stdout. Defaults to a name derived from the query.
    pub file: Option<String>,
}

impl WriteCsvArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let engine = global.remote_engine()?;
        let fetched = engine
            .results(&self.query_id)
            .with_context(|| format!("failed to fetch results of query {}", self.query_id))?;

        let file = self
            .file
            .unwrap_or_else(|| default_csv_name(&fetched.name, &self.query_id));

        if file == "-" {
            write_rows(&mut csv::Writer::from_writer(io::stdout()), &fetched.results)?;
            return Ok(());
        }

        let path = engine.path_of(&file);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("cannot create '{}'", path.display()))?;
        write_rows(&mut writer, &fetched.results)
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        println!("✓ Wrote {} rows to {}", fetched.results.rows.len(), file);
        Ok(())
    }
}

fn default_csv_name(name: &str, id: &QueryId) -> String {
    let stem = stub(name);
    if stem.is_empty() {
        format!("query_{id}.csv")
    } else {
        format!("{stem}.csv")
    }
}

fn write_rows<W: io::Write>(writer: &mut csv::Writer<W>, results: &ResultSet) -> Result<()> {
    writer.write_record(&results.columns)?;
    for row in results.text_rows() {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}
