use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use dealboard::config::DealboardConfig;

mod cmd;

#[derive(Parser)]
#[command(name = "dealboard")]
#[command(version, about = "CRM pipeline board: drag deals between stages")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to dealboard.toml (defaults to ./dealboard.toml, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL. Overrides dealboard.toml and DEALBOARD_API_URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the pipeline and print the five stage columns
    Board {
        /// Print the columns as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move a deal to another stage, as if dropped on that column
    Move {
        deal_id: String,
        /// Target stage: lead, contacted, proposal, won, lost
        stage: String,
    },
    /// Create a deal in the lead column
    Create {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        currency: Option<String>,
    },
    /// Merge duplicate customers into a primary (dry run unless --commit)
    Merge {
        primary: String,
        #[arg(required = true, num_args = 1..)]
        duplicates: Vec<String>,
        /// Perform the merge after previewing it
        #[arg(long)]
        commit: bool,
    },
    /// Serve the board over HTTP and WebSocket
    Serve {
        /// Port to serve on (defaults to [server] port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Enable dev mode (CORS permissive, bind on all interfaces)
        #[arg(long)]
        dev: bool,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Write a default dealboard.toml
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = DealboardConfig::load(cli.config.as_deref(), cli.api_url.clone(), cli.verbose)?;

    if let Commands::Config { command } = &cli.command {
        return cmd::cmd_config(&config, command.clone());
    }

    let _log_guard = dealboard::logging::init(&config.toml.logging, cli.verbose)?;

    match &cli.command {
        Commands::Board { json } => cmd::cmd_board(&config, *json).await?,
        Commands::Move { deal_id, stage } => cmd::cmd_move(&config, deal_id, stage).await?,
        Commands::Create {
            title,
            amount,
            currency,
        } => {
            cmd::cmd_create(&config, title.clone(), *amount, currency.clone()).await?;
        }
        Commands::Merge {
            primary,
            duplicates,
            commit,
        } => cmd::cmd_merge(&config, primary, duplicates, *commit).await?,
        Commands::Serve { port, dev } => cmd::cmd_serve(&config, *port, *dev).await?,
        Commands::Config { .. } => {}
    }

    Ok(())
}
