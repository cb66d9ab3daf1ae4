//! Full-file transfer
//!
//! Every transfer copies the whole source file over a freshly truncated
//! destination. Both handles are owned by the call and released on every
//! return path.

use crate::{ConnectionProvider, RemoteError};
use replicator_core::ReplicationTarget;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Transfer failures; all of them are fatal to the replicator
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("failed to open source file {} (check source filepath and file)", .path.display())]
    OpenSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create destination {path} (check destination filepath)")]
    CreateDestination {
        path: String,
        #[source]
        source: RemoteError,
    },

    #[error("failed to copy {} to {destination}", .source_path.display())]
    Copy {
        source_path: PathBuf,
        destination: String,
        #[source]
        source: io::Error,
    },
}

/// Copies the source file to the destination through a connection
pub struct TransferExecutor<C> {
    connection: Arc<C>,
    source: PathBuf,
    destination: String,
}

impl<C: ConnectionProvider> TransferExecutor<C> {
    pub fn new(connection: Arc<C>, target: &ReplicationTarget) -> Self {
        Self::with_paths(connection, target.source_path(), target.destination_path())
    }

    pub fn with_paths(connection: Arc<C>, source: PathBuf, destination: String) -> Self {
        Self {
            connection,
            source,
            destination,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Copy the whole source file, returning the number of bytes written
    pub async fn transfer(&self) -> Result<u64, TransferError> {
        let mut src = File::open(&self.source)
            .await
            .map_err(|source| TransferError::OpenSource {
                path: self.source.clone(),
                source,
            })?;

        let mut dst = self
            .connection
            .create_or_truncate(&self.destination)
            .await
            .map_err(|source| TransferError::CreateDestination {
                path: self.destination.clone(),
                source,
            })?;

        let bytes = tokio::io::copy(&mut src, &mut dst)
            .await
            .map_err(|e| self.copy_error(e))?;

        // Closes the remote handle; a failure here means the data may not have landed
        dst.shutdown().await.map_err(|e| self.copy_error(e))?;

        debug!(
            "Copied {} bytes from {} to {}",
            bytes,
            self.source.display(),
            self.destination
        );
        Ok(bytes)
    }

    fn copy_error(&self, source: io::Error) -> TransferError {
        TransferError::Copy {
            source_path: self.source.clone(),
            destination: self.destination.clone(),
            source,
        }
    }
}
