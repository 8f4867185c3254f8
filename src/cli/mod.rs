pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "freshet")]
#[command(about = "Keeps RSS/Atom feeds synchronized into a local store", long_about = None)]
pub struct Cli {
    /// Number of feeds reconciled concurrently
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Config file (default: ~/.config/freshet/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file (overrides the config file)
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a feed and fetch its entries
    Add {
        /// URL of the feed; `http://` is assumed when no scheme is given
        url: String,
    },
    /// Remove a feed and its entries
    Remove {
        /// URL of the feed to remove
        url: String,
    },
    /// Run one update pass over every feed
    Update,
    /// List feeds or entries
    List {
        /// Show entries instead of feeds
        #[arg(long)]
        entries: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Run the periodic updater in the foreground
    Daemon {
        /// Update interval (e.g., "100s", "30m", "1h")
        #[arg(short, long)]
        interval: Option<String>,

        /// Skip initial update on start
        #[arg(long)]
        no_initial_update: bool,
    },
}
