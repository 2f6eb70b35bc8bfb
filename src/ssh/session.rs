// ABOUTME: An authenticated SSH session to one host.
// ABOUTME: Runs commands on fresh channels, collecting exit code and output.

use russh::client::{self, Handle};
use russh::{ChannelMsg, Disconnect};
use std::sync::Arc;
use std::time::Duration;

use super::auth::Credentials;
use super::config::SessionConfig;
use super::error::{Error, Result};
use super::host_keys::KnownHosts;
use crate::executor::CommandOutput;

pub struct Session {
    config: SessionConfig,
    handle: Handle<KnownHosts>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("destination", &self.config.destination())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub async fn connect(config: SessionConfig) -> Result<Self> {
        let credentials = Credentials::discover(&config).await?;

        let client_config = client::Config {
            inactivity_timeout: Some(Duration::from_secs(30)),
            ..Default::default()
        };
        let verifier = KnownHosts {
            host: config.host.clone(),
            port: config.port,
            trust_on_first_use: config.trust_on_first_use,
            path: config.known_hosts_path.clone(),
        };

        let mut handle = client::connect(
            Arc::new(client_config),
            (config.host.as_str(), config.port),
            verifier,
        )
        .await
        .map_err(|e| Error::Connection {
            host: config.host.clone(),
            port: config.port,
            reason: e.to_string(),
        })?;

        if !credentials.authenticate(&mut handle, &config.user).await? {
            return Err(Error::AuthenticationFailed {
                user: config.user.clone(),
                host: config.host.clone(),
            });
        }

        tracing::debug!(destination = %config.destination(), "ssh session established");
        Ok(Self { config, handle })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run `command` through the remote user's shell, bounded by the
    /// configured command timeout.
    pub async fn exec(&self, command: &str) -> Result<CommandOutput> {
        let timeout = self.config.command_timeout;
        tokio::time::timeout(timeout, self.exec_on_channel(command))
            .await
            .map_err(|_| Error::CommandTimeout(timeout))?
    }

    async fn exec_on_channel(&self, command: &str) -> Result<CommandOutput> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| Error::Channel(e.to_string()))?;
        channel.exec(true, command).await?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_code = None;
        let mut eof = false;

        // Exit status and EOF may arrive in either order; both end the command.
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { data } => stdout.extend_from_slice(&data),
                ChannelMsg::ExtendedData { data, ext: 1 } => stderr.extend_from_slice(&data),
                ChannelMsg::ExitStatus { exit_status } => exit_code = Some(exit_status),
                ChannelMsg::Eof => eof = true,
                ChannelMsg::Close => break,
                _ => {}
            }
            if eof && exit_code.is_some() {
                break;
            }
        }

        let exit_code = exit_code.ok_or(Error::ChannelClosed)?;
        Ok(CommandOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }

    pub async fn disconnect(self) -> Result<()> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await?;
        Ok(())
    }
}
