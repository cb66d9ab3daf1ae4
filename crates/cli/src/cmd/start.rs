//! Start replicating

use crate::coordinator::Coordinator;
use crate::{daemon, util};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use remote::{ConnectionProvider, SftpConnection};
use replicator_core::{load_or_init, shutdown_channel, LoadOutcome};
use std::path::Path;
use std::sync::Arc;
use tracing::error;

pub async fn run(config_path: &Path) -> Result<()> {
    let target = match load_or_init(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?
    {
        LoadOutcome::Loaded(target) => target,
        LoadOutcome::Created(path) => anyhow::bail!(
            "New file successfully created. Edit {} to include source and target file, then rerun",
            path.display()
        ),
    };

    util::print_target(&target);

    let connection = Arc::new(
        SftpConnection::open(&target)
            .await
            .with_context(|| format!("Failed to connect to {}", target.endpoint()))?,
    );
    println!(
        "{}",
        "SFTP session successfully established. Hit CTRL+C to exit at any time.".green()
    );

    let source = target.source_path();
    let subscription = match watcher::subscribe(&source) {
        Ok(subscription) => subscription,
        Err(e) => {
            if let Err(close_err) = connection.close().await {
                error!("Failed to close remote connection: {}", close_err);
            }
            return Err(e).with_context(|| {
                format!(
                    "Failed to watch {} (check source filepath and file)",
                    source.display()
                )
            });
        }
    };

    let (trigger, signal) = shutdown_channel();
    let listener = daemon::spawn_interrupt_listener(trigger);

    let coordinator = Coordinator::new(&target, subscription, connection.clone(), signal);
    let result = daemon::run(coordinator, connection).await;
    listener.abort();

    let summary = result?;
    println!(
        "{} updates, {} copied",
        summary.transfers,
        util::format_size(summary.bytes)
    );
    println!("Program exit at {}", chrono::Local::now().format("%I:%M:%S"));
    Ok(())
}
