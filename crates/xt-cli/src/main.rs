use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use xt_cli::commands::{events, fetch, run, test_service, view};
use xt_cli::{Cli, Commands, Config};

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    // Logs go to stderr so command output on stdout stays clean
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let mut stdout = io::stdout().lock();
    match &cli.command {
        Some(Commands::Run) => {
            let config = load_config(cli.config.as_deref())?;
            if let Some(parent) = config.database_path.parent() {
                std::fs::create_dir_all(parent).context("failed to create database directory")?;
            }
            run::run(&config).await?;
        }
        Some(Commands::Fetch(args)) => {
            let config = load_config(cli.config.as_deref())?;
            let count = fetch::run(&mut stdout, &config, args).await?;
            tracing::info!(count, "fetched tidal events");
        }
        Some(Commands::TestService(args)) => {
            let config = load_config(cli.config.as_deref())?;
            test_service::run(&mut stdout, &config, args).await?;
        }
        Some(Commands::View { database }) => {
            // View reads the file directly and does not need config
            view::run(&mut stdout, database)?;
        }
        Some(Commands::Events { max, json }) => {
            let config = load_config(cli.config.as_deref())?;
            events::run(&mut stdout, &config, *max, *json)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
