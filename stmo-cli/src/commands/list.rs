//! `stmocli list`

use anyhow::Result;
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

use stmo_core::Registry;

use super::GlobalArgs;

/// List tracked files and the queries behind them.
#[derive(Args, Debug)]
pub struct ListArgs {}

#[derive(Tabled)]
struct TrackedRow {
    #[tabled(rename = "file")]
    file: String,
    #[tabled(rename = "query id")]
    id: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "data source")]
    data_source: String,
}

impl ListArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let engine = global.engine()?;
        let registry = engine.registry();
        if registry.is_empty() {
            println!("No queries tracked. Run `stmocli track <query_id>` first.");
            return Ok(());
        }

        println!("{}", render(registry));
        println!("{}", summary(registry));
        Ok(())
    }
}

fn render(registry: &Registry) -> String {
    let rows = registry.iter().map(|(file, record)| TrackedRow {
        file: file.to_owned(),
        id: record.id.to_string(),
        name: record.name.clone(),
        data_source: record
            .data_source_id
            .map_or_else(|| "-".to_string(), |id| id.to_string()),
    });
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

fn summary(registry: &Registry) -> String {
    match registry.len() {
        1 => "1 query tracked".to_string(),
        n => format!("{n} queries tracked"),
    }
}
