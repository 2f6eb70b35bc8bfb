// ABOUTME: Connection settings for one SSH session.
// ABOUTME: Built from the ssh section of cutover.yml and a host address.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Private key to use. Without one, the agent and then the default
    /// `~/.ssh` keys are tried.
    pub key_path: Option<PathBuf>,
    /// Accept and record host keys not yet in known_hosts.
    pub trust_on_first_use: bool,
    /// Defaults to `~/.ssh/known_hosts`.
    pub known_hosts_path: Option<PathBuf>,
    pub command_timeout: Duration,
}

impl SessionConfig {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            user: user.into(),
            key_path: None,
            trust_on_first_use: false,
            known_hosts_path: None,
            command_timeout: Duration::from_secs(300),
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_path = Some(path.into());
        self
    }

    pub fn trust_on_first_use(mut self, tofu: bool) -> Self {
        self.trust_on_first_use = tofu;
        self
    }

    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// `user@host:port`, for logs.
    pub fn destination(&self) -> String {
        format!("{}@{}:{}", self.user, self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = SessionConfig::new("10.0.0.1", "deploy")
            .port(2222)
            .trust_on_first_use(true)
            .command_timeout(Duration::from_secs(10));
        assert_eq!(config.destination(), "deploy@10.0.0.1:2222");
        assert!(config.trust_on_first_use);
        assert!(config.key_path.is_none());
        assert_eq!(config.command_timeout, Duration::from_secs(10));
    }
}
