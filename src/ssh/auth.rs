// ABOUTME: Credential discovery and public key authentication.
// ABOUTME: Explicit key file first, then the SSH agent, then ~/.ssh defaults.

use russh::client::Handle;
use russh::keys::agent::client::AgentClient;
use russh::keys::{PrivateKeyWithHashAlg, load_secret_key, ssh_key};
use std::path::Path;
use std::sync::Arc;
use tokio::net::UnixStream;

use super::config::SessionConfig;
use super::error::{Error, Result};
use super::host_keys::KnownHosts;

const DEFAULT_KEYS: [&str; 3] = ["id_ed25519", "id_ecdsa", "id_rsa"];

pub(super) enum Credentials {
    Agent(AgentClient<UnixStream>),
    Key(Arc<ssh_key::PrivateKey>),
}

impl Credentials {
    pub async fn discover(config: &SessionConfig) -> Result<Self> {
        if let Some(path) = &config.key_path {
            return load_key(path).map(Credentials::Key);
        }

        if let Ok(agent) = AgentClient::connect_env().await {
            return Ok(Credentials::Agent(agent));
        }

        let home = std::env::var("HOME").map_err(|_| {
            Error::NoCredentials("no SSH agent and HOME is not set".to_string())
        })?;
        let ssh_dir = Path::new(&home).join(".ssh");

        DEFAULT_KEYS
            .iter()
            .find_map(|name| load_key(&ssh_dir.join(name)).ok())
            .map(Credentials::Key)
            .ok_or_else(|| {
                Error::NoCredentials(format!(
                    "no SSH agent and no key found in {}",
                    ssh_dir.display()
                ))
            })
    }

    /// Try each identity in turn; `false` when the server accepted none.
    pub async fn authenticate(self, handle: &mut Handle<KnownHosts>, user: &str) -> Result<bool> {
        match self {
            Credentials::Agent(mut agent) => {
                let identities = agent.request_identities().await.map_err(|e| {
                    Error::NoCredentials(format!("failed to list agent keys: {e}"))
                })?;
                if identities.is_empty() {
                    return Err(Error::NoCredentials("SSH agent holds no keys".to_string()));
                }

                for identity in identities {
                    let accepted = handle
                        .authenticate_publickey_with(user, identity, None, &mut agent)
                        .await
                        .is_ok_and(|result| result.success());
                    if accepted {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Credentials::Key(key) => {
                let hash = handle.best_supported_rsa_hash().await?.flatten();
                let result = handle
                    .authenticate_publickey(user, PrivateKeyWithHashAlg::new(key, hash))
                    .await?;
                Ok(result.success())
            }
        }
    }
}

fn load_key(path: &Path) -> Result<Arc<ssh_key::PrivateKey>> {
    load_secret_key(path, None)
        .map(Arc::new)
        .map_err(|e| Error::KeyLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}
