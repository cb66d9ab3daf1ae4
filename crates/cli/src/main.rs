//! Replicator CLI - replicator command

use anyhow::Result;
use clap::Parser;
use cli_lib::cmd;
use replicator_core::DEFAULT_CONFIG_FILE;
use std::path::PathBuf;

/// Replicate a single local file to a remote host over SFTP
#[derive(Parser)]
#[command(name = "replicator")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the JSON configuration file (created with defaults if missing)
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    cmd::start::run(&cli.config).await
}
