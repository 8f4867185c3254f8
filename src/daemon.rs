//! Foreground update daemon.
//!
//! Runs the update scheduler on its interval until SIGINT/SIGTERM
//! (Ctrl-C on Windows).

use std::sync::Arc;
use std::time::Duration;

use crate::app::{AppContext, Result};
use crate::config::{format_interval, SyncConfig};

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub update_interval: Duration,
    /// Whether to run an update immediately on start
    pub update_on_start: bool,
}

impl From<&SyncConfig> for DaemonConfig {
    fn from(sync: &SyncConfig) -> Self {
        Self {
            update_interval: sync.update_interval,
            update_on_start: sync.update_on_start,
        }
    }
}

/// Daemon runner
pub struct Daemon {
    ctx: Arc<AppContext>,
    config: DaemonConfig,
}

impl Daemon {
    pub fn new(ctx: Arc<AppContext>, config: DaemonConfig) -> Self {
        Self { ctx, config }
    }

    pub async fn run(&self) -> Result<()> {
        tracing::info!(
            "Freshet daemon started (update interval: {}, PID: {})",
            format_interval(self.config.update_interval.as_secs()),
            std::process::id()
        );

        if self.config.update_on_start {
            tracing::info!("Running initial update...");
            if let Err(e) = self.ctx.scheduler.run_once().await {
                tracing::error!("Initial update failed: {}", e);
            }
        }

        let timer = self.ctx.scheduler.start(self.config.update_interval);

        let result = shutdown_signal().await;
        tracing::info!("Daemon shutting down...");
        timer.abort();

        result
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {},
        _ = sigint.recv() => {},
    }
    Ok(())
}

#[cfg(windows)]
async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
