//! Connection error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while establishing or using the remote connection
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("unable to read private key {}", .path.display())]
    Key {
        path: PathBuf,
        #[source]
        source: russh::keys::Error,
    },

    #[error("unable to connect to {endpoint} (ensure your public key has been copied to the server)")]
    Connect {
        endpoint: String,
        #[source]
        source: russh::Error,
    },

    #[error("host {host} is not listed in {}", .known_hosts.display())]
    UnknownHost { host: String, known_hosts: PathBuf },

    #[error("could not verify host key for {host}")]
    HostKey {
        host: String,
        #[source]
        source: russh::keys::Error,
    },

    #[error("public key authentication as {user} was rejected")]
    Auth { user: String },

    #[error("SSH protocol error")]
    Ssh(#[from] russh::Error),

    #[error("failed to apply SFTP protocol layer to SSH connection")]
    Sftp(#[source] russh_sftp::client::error::Error),

    #[error("failed to create remote file {path}")]
    Create {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
