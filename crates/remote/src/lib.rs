//! Remote side of replication
//!
//! This crate provides:
//! - `ConnectionProvider`, the seam transfers write through
//! - `SftpConnection`, the SSH + SFTP implementation
//! - `TransferExecutor`, one full-file copy per call

pub mod error;
pub mod provider;
pub mod sftp;
pub mod transfer;

mod ssh_client;

// Re-exports
pub use error::RemoteError;
pub use provider::ConnectionProvider;
pub use sftp::SftpConnection;
pub use transfer::{TransferError, TransferExecutor};
