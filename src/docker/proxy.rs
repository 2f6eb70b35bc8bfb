// ABOUTME: Commands for the reverse proxy container fronting proxied roles.
// ABOUTME: Registers a new target; the proxy drains the previous one itself.

use super::docker;
use crate::config::Config;
use crate::shell::{Command, Opt, optionize};

#[derive(Debug, Clone)]
pub struct Proxy<'a> {
    config: &'a Config,
}

impl<'a> Proxy<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Name the proxy routes the service under.
    fn service_name(&self) -> String {
        match &self.config.destination {
            Some(destination) => format!("{}-{}", self.config.service, destination),
            None => self.config.service.to_string(),
        }
    }

    /// Point the service at `container:port`.
    pub fn deploy(&self, container: &str, port: u16) -> Command {
        let proxy = self.config.proxy.container.as_str();
        let timeout = format!("{}s", self.config.proxy.deploy_timeout.as_secs());

        docker(["exec", proxy, proxy, "deploy"])
            .arg(self.service_name())
            .args(optionize(
                [
                    ("target", Opt::Value(format!("{container}:{port}"))),
                    ("deploy-timeout", Opt::Value(timeout)),
                ],
                Some("="),
            ))
    }
}
