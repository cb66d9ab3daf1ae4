//! Connection provider seam

use crate::RemoteError;
use async_trait::async_trait;
use tokio::io::AsyncWrite;

/// An open, authenticated channel to the remote host
///
/// Opening is done by the implementation's constructor. The provider is
/// shared between the transfer executor and the daemon that closes it, but
/// is never used from two call sites at once.
#[async_trait]
pub trait ConnectionProvider: Send + Sync + 'static {
    /// Writable remote file handle
    type Writer: AsyncWrite + Unpin + Send;

    /// Create `remote_path`, truncating it if it already exists
    async fn create_or_truncate(&self, remote_path: &str) -> Result<Self::Writer, RemoteError>;

    /// Release the connection
    ///
    /// Only the first call does any work; later calls return `Ok(())`.
    async fn close(&self) -> Result<(), RemoteError>;
}
