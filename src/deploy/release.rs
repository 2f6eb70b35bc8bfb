// ABOUTME: Drives one release: a boot per host, run concurrently.
// ABOUTME: Shares a barrier between primary and other roles, collects every outcome.

use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::config::{Config, Host, Role};
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::healthcheck::Poller;
use crate::types::Version;

use super::{Barrier, Boot, BootReport, DeployError};

/// A host to boot on, with the executor connected to it.
#[derive(Clone)]
pub struct Target {
    pub host: Host,
    pub executor: Arc<dyn Executor>,
}

/// Result of booting one role on one host.
#[derive(Debug)]
pub struct HostOutcome {
    pub host: String,
    pub role: String,
    pub result: std::result::Result<BootReport, DeployError>,
}

#[derive(Debug, Default)]
pub struct ReleaseReport {
    pub outcomes: Vec<HostOutcome>,
}

impl ReleaseReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&HostOutcome, &DeployError)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().err().map(|err| (outcome, err)))
    }
}

pub struct Release<'a> {
    config: &'a Config,
    version: &'a Version,
    poller: Poller,
}

impl<'a> Release<'a> {
    pub fn new(config: &'a Config, version: &'a Version) -> Self {
        Self {
            config,
            version,
            poller: Poller::from_config(&config.healthcheck),
        }
    }

    pub fn with_poller(mut self, poller: Poller) -> Self {
        self.poller = poller;
        self
    }

    /// Boot every target, at most `boot.limit` at a time.
    ///
    /// Primary role targets are started first so that a limited pool never
    /// fills up with hosts waiting on a barrier nobody can open.
    pub async fn run(&self, targets: Vec<Target>) -> Result<ReleaseReport> {
        let roles = self.config.roles()?;
        let mut targets = targets
            .into_iter()
            .map(|target| match roles.iter().find(|role| role.name == target.host.role) {
                Some(role) => Ok((target, role)),
                None => Err(Error::InvalidConfig(format!(
                    "unknown role: {}",
                    target.host.role
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        targets.sort_by_key(|(_, role)| !role.primary);

        let barrier = self.barrier_for(&targets);
        let limit = self.config.boot.concurrency(targets.len());

        tracing::info!(
            version = %self.version,
            hosts = targets.len(),
            limit,
            barrier = barrier.is_some(),
            "starting release"
        );

        let outcomes = stream::iter(targets)
            .map(|(target, role)| {
                let barrier = barrier.clone();
                async move {
                    let boot = Boot::new(
                        self.config,
                        role,
                        self.version,
                        target.executor.as_ref(),
                        &self.poller,
                        barrier,
                    );
                    let result = boot.run().await;
                    match &result {
                        Ok(_) => tracing::info!(
                            host = %target.host.address,
                            role = %role.name,
                            "booted"
                        ),
                        Err(e) => tracing::error!(
                            host = %target.host.address,
                            role = %role.name,
                            "boot failed: {}",
                            e
                        ),
                    }
                    HostOutcome {
                        host: target.host.address.to_string(),
                        role: role.name.clone(),
                        result,
                    }
                }
            })
            .buffer_unordered(limit)
            .collect()
            .await;

        Ok(ReleaseReport { outcomes })
    }

    /// A barrier is only needed when primary and other roles boot together.
    fn barrier_for(&self, targets: &[(Target, &Role)]) -> Option<Arc<Barrier>> {
        let has_primary = targets.iter().any(|(_, role)| role.primary);
        let has_other = targets.iter().any(|(_, role)| !role.primary);
        (has_primary && has_other).then(|| Arc::new(Barrier::new()))
    }
}
