//! SSH + SFTP connection provider

use crate::ssh_client::Client;
use crate::{ConnectionProvider, RemoteError};
use async_trait::async_trait;
use replicator_core::ReplicationTarget;
use russh::client::{self, Handle};
use russh::keys::PrivateKeyWithHashAlg;
use russh::Disconnect;
use russh_sftp::client::fs::File;
use russh_sftp::client::SftpSession;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Authenticated SFTP session on top of one SSH connection
pub struct SftpConnection {
    endpoint: String,
    sftp: SftpSession,
    /// Taken on close so the session is torn down once
    session: Mutex<Option<Handle<Client>>>,
}

impl SftpConnection {
    /// Dial the target's endpoint, verify the host key, authenticate with
    /// the local private key and start the SFTP subsystem
    pub async fn open(target: &ReplicationTarget) -> Result<Self, RemoteError> {
        let endpoint = target.endpoint();
        let key_path = target.private_key_path();

        let key = russh::keys::load_secret_key(&key_path, None).map_err(|source| {
            RemoteError::Key {
                path: key_path.clone(),
                source,
            }
        })?;

        let handler = Client {
            host: endpoint.address.clone(),
            port: endpoint.port,
            known_hosts: target.known_hosts_path(),
        };
        let config = Arc::new(client::Config::default());

        let mut session = client::connect(config, (endpoint.address.as_str(), endpoint.port), handler)
            .await
            .map_err(|e| match e {
                RemoteError::Ssh(source) => RemoteError::Connect {
                    endpoint: endpoint.to_string(),
                    source,
                },
                other => other,
            })?;

        let hash_alg = session.best_supported_rsa_hash().await?.flatten();
        let auth = session
            .authenticate_publickey(
                endpoint.user.clone(),
                PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
            )
            .await?;
        if !auth.success() {
            return Err(RemoteError::Auth {
                user: endpoint.user.clone(),
            });
        }
        info!("SSH (transport layer) channel opened to {}", endpoint);

        let channel = session.channel_open_session().await?;
        channel.request_subsystem(true, "sftp").await?;
        let sftp = SftpSession::new(channel.into_stream())
            .await
            .map_err(RemoteError::Sftp)?;
        info!("SFTP session established");

        Ok(Self {
            endpoint: endpoint.to_string(),
            sftp,
            session: Mutex::new(Some(session)),
        })
    }
}

#[async_trait]
impl ConnectionProvider for SftpConnection {
    type Writer = File;

    async fn create_or_truncate(&self, remote_path: &str) -> Result<File, RemoteError> {
        self.sftp
            .create(remote_path)
            .await
            .map_err(|e| RemoteError::Create {
                path: remote_path.to_string(),
                source: Box::new(e),
            })
    }

    async fn close(&self) -> Result<(), RemoteError> {
        let Some(session) = self.session.lock().await.take() else {
            return Ok(());
        };

        if let Err(e) = self.sftp.close().await {
            warn!("SFTP session did not close cleanly: {}", e);
        }
        session
            .disconnect(Disconnect::ByApplication, "", "English")
            .await?;

        info!("Closed connection to {}", self.endpoint);
        Ok(())
    }
}
