// ABOUTME: Server key verification against known_hosts.
// ABOUTME: Optionally learns unknown hosts (trust on first use), never changed keys.

use russh::client;
use russh::keys::known_hosts::{
    check_known_hosts, check_known_hosts_path, learn_known_hosts, learn_known_hosts_path,
};
use russh::keys::ssh_key::PublicKey;
use std::path::PathBuf;

/// russh client handler that only verifies the server key.
pub(super) struct KnownHosts {
    pub host: String,
    pub port: u16,
    pub trust_on_first_use: bool,
    pub path: Option<PathBuf>,
}

impl KnownHosts {
    fn check(&self, key: &PublicKey) -> Result<bool, russh::keys::Error> {
        match &self.path {
            Some(path) => check_known_hosts_path(&self.host, self.port, key, path),
            None => check_known_hosts(&self.host, self.port, key),
        }
    }

    fn learn(&self, key: &PublicKey) {
        let learned = match &self.path {
            Some(path) => learn_known_hosts_path(&self.host, self.port, key, path),
            None => learn_known_hosts(&self.host, self.port, key),
        };
        if let Err(e) = learned {
            tracing::warn!(host = %self.host, "could not record host key: {}", e);
        }
    }
}

impl client::Handler for KnownHosts {
    type Error = russh::Error;

    async fn check_server_key(&mut self, key: &PublicKey) -> Result<bool, Self::Error> {
        match self.check(key) {
            Ok(true) => Ok(true),
            Err(russh::keys::Error::KeyChanged { .. }) => {
                tracing::error!(
                    host = %self.host,
                    "host key does not match known_hosts, refusing to connect"
                );
                Ok(false)
            }
            Ok(false) | Err(_) if self.trust_on_first_use => {
                tracing::warn!(
                    host = %self.host,
                    port = self.port,
                    "accepting unknown host key (trust on first use)"
                );
                self.learn(key);
                Ok(true)
            }
            Ok(false) | Err(_) => Ok(false),
        }
    }
}
