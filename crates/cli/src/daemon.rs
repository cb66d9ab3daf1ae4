//! Replicator lifecycle
//!
//! Runs the coordinator on its own task and tears everything down in a
//! fixed order once it returns: the subscription goes first (it is owned
//! by the coordinator), then the remote connection is closed exactly once.

use crate::coordinator::{Coordinator, RunSummary};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use remote::ConnectionProvider;
use replicator_core::ShutdownTrigger;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Fire `trigger` on the first Ctrl+C; later interrupts are ignored
pub fn spawn_interrupt_listener(trigger: ShutdownTrigger) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Unable to listen for Ctrl+C: {}", e);
                return;
            }
            if trigger.fire() {
                println!("\n{}", "CTRL+C hit! Program exiting gracefully".yellow());
            }
        }
    })
}

/// Run `coordinator` to completion, then close `connection`
///
/// A fatal coordinator error is returned only after the connection has
/// been released.
pub async fn run<C: ConnectionProvider>(
    coordinator: Coordinator<C>,
    connection: Arc<C>,
) -> Result<RunSummary> {
    let outcome = tokio::spawn(coordinator.run()).await;

    if let Err(e) = connection.close().await {
        error!("Failed to close remote connection: {}", e);
    }

    let summary = outcome
        .context("Replicator task panicked")?
        .context("Replication stopped")?;
    info!(
        "Replicator stopped after {} updates ({} bytes)",
        summary.transfers, summary.bytes
    );
    Ok(summary)
}
