use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use freshet::app::AppContext;
use freshet::cli::{commands, Cli, Commands};
use freshet::config::{parse_interval, Config};
use freshet::daemon::{Daemon, DaemonConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("freshet=info")))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(workers) = cli.workers {
        config.sync.workers = workers;
    }
    if let Some(database) = cli.database {
        config.store.path = Some(database);
    }

    let ctx = AppContext::new(config).context("failed to open feed store")?;

    match cli.command {
        Commands::Add { url } => {
            commands::add_feed(&ctx, &url).await?;
        }
        Commands::Remove { url } => {
            commands::remove_feed(&ctx, &url)?;
        }
        Commands::Update => {
            commands::update_feeds(&ctx).await?;
        }
        Commands::List { entries, json } => {
            if entries {
                commands::list_entries(&ctx, json)?;
            } else {
                commands::list_feeds(&ctx, json)?;
            }
        }
        Commands::Daemon {
            interval,
            no_initial_update,
        } => {
            let mut daemon_config = DaemonConfig::from(&ctx.config.sync);
            if let Some(interval) = interval {
                let secs = parse_interval(&interval).map_err(anyhow::Error::msg)?;
                daemon_config.update_interval = Duration::from_secs(secs);
            }
            if no_initial_update {
                daemon_config.update_on_start = false;
            }

            Daemon::new(Arc::new(ctx), daemon_config).run().await?;
        }
    }

    Ok(())
}
