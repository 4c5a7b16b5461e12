//! Don't Kill It! CLI
//!
//! Command-line client for real-time plant-care notifications.

mod commands;
mod config;
mod display;

use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "dki")]
#[command(version, about = "Real-time plant-care notifications")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API base URL (ws, wss, http or https)
    #[arg(
        long,
        global = true,
        env = "DKI_WS_URL",
        default_value = dki_core::network::DEFAULT_BASE_URL
    )]
    url: String,

    /// Session token
    #[arg(long, global = true, env = "DKI_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Heartbeat interval in milliseconds
    #[arg(long, global = true, env = "DKI_HEARTBEAT_MS")]
    heartbeat_ms: Option<u64>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen for notifications
    Listen {
        /// Print raw JSON payloads, one per line
        #[arg(long)]
        json: bool,

        /// Exit after this many notifications
        #[arg(long, value_name = "N")]
        count: Option<usize>,
    },

    /// Show the resolved notification endpoint
    Endpoint {
        /// Include the token instead of redacting it
        #[arg(long)]
        show_token: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("dki_core={}", level).parse()?)
        .add_directive(format!("dki={}", level).parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    if let Commands::Completions { shell } = cli.command {
        generate(shell, &mut Cli::command(), "dki", &mut io::stdout());
        return Ok(());
    }

    let config = CliConfig::new(&cli.url, cli.token, cli.heartbeat_ms)?;

    match cli.command {
        Commands::Listen { json, count } => {
            commands::listen::run(&config, json, count).await?;
        }
        Commands::Endpoint { show_token } => {
            commands::endpoint::run(&config, show_token)?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
