use crate::RemoteError;
use russh::client::Handler;
use russh::keys::{HashAlg, PublicKey};
use std::path::PathBuf;
use tracing::{debug, info};

/// SSH client handler that only trusts hosts listed in `known_hosts`
pub(crate) struct Client {
    pub host: String,
    pub port: u16,
    pub known_hosts: PathBuf,
}

impl Handler for Client {
    type Error = RemoteError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint(HashAlg::Sha256);
        debug!("server key fp sha256: {}", fingerprint);

        match russh::keys::check_known_hosts_path(
            &self.host,
            self.port,
            server_public_key,
            &self.known_hosts,
        ) {
            Ok(true) => {
                info!("Host key for {} verified ({})", self.host, fingerprint);
                Ok(true)
            }
            Ok(false) => Err(RemoteError::UnknownHost {
                host: self.host.clone(),
                known_hosts: self.known_hosts.clone(),
            }),
            Err(source) => Err(RemoteError::HostKey {
                host: self.host.clone(),
                source,
            }),
        }
    }
}
