// ABOUTME: Opens one SSH session per distinct host of a release.
// ABOUTME: Roles sharing a host share its executor; sessions close at the end.

use futures::future::try_join_all;
use std::collections::BTreeMap;
use std::sync::Arc;

use cutover::config::{Config, Host, HostAddress, SshConfig};
use cutover::deploy::Target;
use cutover::error::Result;
use cutover::executor::{Executor, SshExecutor};
use cutover::output::Output;
use cutover::ssh::Session;

pub struct Connections {
    ssh: SshConfig,
    /// Keyed by `user@host:port`, so different users never share a session.
    executors: BTreeMap<String, Arc<SshExecutor>>,
}

fn session_key(ssh: &SshConfig, address: &HostAddress) -> String {
    ssh.session_config(address).destination()
}

impl Connections {
    /// Connect to every host in `hosts` concurrently.
    pub async fn open(config: &Config, hosts: &[Host], output: &Output) -> Result<Self> {
        let mut addresses = BTreeMap::new();
        for host in hosts {
            addresses
                .entry(session_key(&config.ssh, &host.address))
                .or_insert_with(|| host.address.clone());
        }

        let executors = try_join_all(addresses.into_iter().map(|(key, address)| async move {
            output.progress(&format!("  → Connecting to {key}..."));
            let session = Session::connect(config.ssh.session_config(&address)).await?;
            let executor = SshExecutor::new(address.to_string(), session);
            Ok::<_, cutover::error::Error>((key, Arc::new(executor)))
        }))
        .await?;

        Ok(Self {
            ssh: config.ssh.clone(),
            executors: executors.into_iter().collect(),
        })
    }

    pub fn executor(&self, host: &Host) -> Option<Arc<SshExecutor>> {
        self.executors
            .get(&session_key(&self.ssh, &host.address))
            .cloned()
    }

    pub fn targets(&self, hosts: &[Host]) -> Vec<Target> {
        hosts
            .iter()
            .filter_map(|host| {
                let executor: Arc<dyn Executor> = self.executor(host)?;
                Some(Target {
                    host: host.clone(),
                    executor,
                })
            })
            .collect()
    }

    /// Disconnect every session. Failures are logged, never returned.
    pub async fn close(self) {
        for (host, executor) in self.executors {
            let Ok(executor) = Arc::try_unwrap(executor) else {
                tracing::warn!(host = %host, "session still in use, dropping it");
                continue;
            };
            if let Err(e) = executor.disconnect().await {
                tracing::warn!(host = %host, "SSH disconnect failed: {}", e);
            }
        }
    }
}
