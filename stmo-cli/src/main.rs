//! stmocli: keep local SQL files in sync with Redash queries.
//!
//! # Usage
//!
//! ```text
//! stmocli init
//! stmocli track <query_id> [file]
//! stmocli pull <file>
//! stmocli push [file...]
//! stmocli fork <file|query_id> <new_file>
//! stmocli view <file>
//! stmocli list
//! stmocli write_csv <query_id> [file|-]
//! ```
//!
//! Global options: `--redash-api-key` (`REDASH_API_KEY`), `--registry`
//! (`STMOCLI_REGISTRY`).

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    fork::ForkArgs, init::InitArgs, list::ListArgs, pull::PullArgs, push::PushArgs,
    track::TrackArgs, view::ViewArgs, write_csv::WriteCsvArgs, GlobalArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "stmocli",
    version,
    about = "Track, pull and push Redash queries as local SQL files",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an empty registry in the current directory.
    Init(InitArgs),

    /// Start tracking a remote query in a local file.
    Track(TrackArgs),

    /// Overwrite a tracked file with the remote SQL.
    Pull(PullArgs),

    /// Upload tracked files to the service.
    Push(PushArgs),

    /// Copy a query on the service and track the copy.
    Fork(ForkArgs),

    /// Print the web URL of a tracked query.
    View(ViewArgs),

    /// List tracked files.
    List(ListArgs),

    /// Write the cached results of a query as CSV.
    #[command(name = "write_csv")]
    WriteCsv(WriteCsvArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let global = cli.global;
    match cli.command {
        Commands::Init(args) => args.run(&global),
        Commands::Track(args) => args.run(&global),
        Commands::Pull(args) => args.run(&global),
        Commands::Push(args) => args.run(&global),
        Commands::Fork(args) => args.run(&global),
        Commands::View(args) => args.run(&global),
        Commands::List(args) => args.run(&global),
        Commands::WriteCsv(args) => args.run(&global),
    }
}

/// Log to stderr so stdout stays clean for command output; `RUST_LOG`
/// overrides the default `warn` level.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
