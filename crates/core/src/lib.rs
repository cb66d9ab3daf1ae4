//! Core types for the file replicator
//!
//! This crate provides:
//! - `ReplicationTarget` configuration and the first-run config contract
//! - Change notification types (`ChangeEvent`, `OpKind`)
//! - One-shot cooperative shutdown signal

pub mod config;
pub mod event;
pub mod shutdown;

// Re-exports
pub use config::{
    load_or_init, ConfigError, ConfigFile, LoadOutcome, RemoteEndpoint, ReplicationTarget,
};
pub use event::{ChangeEvent, OpKind};
pub use shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger};

/// Default configuration file name, resolved against the working directory
pub const DEFAULT_CONFIG_FILE: &str = "replicator.conf";
