//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Tide forecast collector.
///
/// Polls the XTide `tide` program once a day and keeps the upcoming high and
/// low tides in a local database.
#[derive(Debug, Parser)]
#[command(name = "xtide", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the service: poll daily and persist every archive period.
    Run,

    /// Run the tide program once and print the parsed events.
    Fetch(TideArgs),

    /// Start the service against a temporary database, poll once, and print what was stored.
    TestService(TideArgs),

    /// Print every event stored in a database file.
    View {
        /// Path to the xtide database.
        #[arg(long)]
        database: PathBuf,
    },

    /// Print stored events for display.
    Events {
        /// Maximum number of events to print.
        #[arg(long)]
        max: Option<usize>,

        /// Output as JSON lines.
        #[arg(long)]
        json: bool,
    },
}

/// Tide program overrides shared by `fetch` and `test-service`.
#[derive(Debug, Args)]
pub struct TideArgs {
    /// The location for which tidal events are requested.
    #[arg(long)]
    pub location: Option<String>,

    /// Path to the tide program.
    #[arg(long)]
    pub prog: Option<PathBuf>,

    /// Number of days to fetch.
    #[arg(long)]
    pub days: Option<u32>,
}
