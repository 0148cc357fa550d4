//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod config_cmd;
mod extract;
mod interactive;
mod saved;
mod search;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use mapsearch::config::Config;

#[derive(Parser)]
#[command(name = "mapsearch")]
#[command(about = "Search a map in plain language")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Run one search and show the places found
    Search {
        /// What to look for, in plain language
        query: String,
        /// Bias results toward a location ("lat,lng" or a city name)
        #[arg(long)]
        near: Option<String>,
        /// Add the places found to saved places
        #[arg(long)]
        save: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract annotated places from a file or stdin (no network)
    Extract {
        /// File to read (stdin if omitted)
        file: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage saved places
    Saved {
        #[command(subcommand)]
        command: SavedCommands,
    },

    /// Line-oriented search session
    Interactive {
        /// Start near a location ("lat,lng" or a city name)
        #[arg(long)]
        near: Option<String>,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
enum SavedCommands {
    /// List saved places
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a saved place by id (or by exact name if no id matches)
    Remove {
        /// Place ID
        id: String,
        /// Place name
        name: String,
    },
    /// Show the viewport that fits all saved places
    Show,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load_with(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Search {
            query,
            near,
            save,
            json,
        } => search::cmd_search(&config, &query, near.as_deref(), save, json).await,
        Commands::Extract { file, json } => extract::cmd_extract(file.as_deref(), json).await,
        Commands::Saved { command } => match command {
            SavedCommands::List { json } => saved::cmd_saved_list(&config, json).await,
            SavedCommands::Remove { id, name } => {
                saved::cmd_saved_remove(&config, &id, &name).await
            }
            SavedCommands::Show => saved::cmd_saved_show(&config).await,
        },
        Commands::Interactive { near } => {
            interactive::cmd_interactive(&config, near.as_deref()).await
        }
        Commands::Config => config_cmd::cmd_config_show(&config),
    }
}
