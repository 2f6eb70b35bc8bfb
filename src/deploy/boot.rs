// ABOUTME: One host's boot sequence: replace a role's container without downtime.
// ABOUTME: Rename clashes, start and health check, cut over, drain and stop the old one.

use std::sync::Arc;

use crate::config::{Config, Role};
use crate::cord::Cord;
use crate::docker::{App, Auditor, Proxy, RunningContainer};
use crate::executor::{ExecOptions, Executor};
use crate::healthcheck::{ContainerStatus, Poller};
use crate::types::Version;

use super::{Barrier, CutoverStrategy, DeployError};

/// Outcome of a successful boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootReport {
    pub host: String,
    pub role: String,
    pub container: String,
    /// The container that was serving before this boot.
    pub old_container: Option<RunningContainer>,
    /// Whether this host's boot opened the release barrier.
    pub opened_barrier: bool,
}

/// Everything one host's boot needs, passed in explicitly.
pub struct Boot<'a> {
    host: &'a str,
    role: &'a Role,
    app: App<'a>,
    auditor: Auditor,
    proxy: Proxy<'a>,
    cords_root: String,
    executor: &'a dyn Executor,
    poller: &'a Poller,
    barrier: Option<Arc<Barrier>>,
    strategy: CutoverStrategy,
}

impl<'a> Boot<'a> {
    pub fn new(
        config: &'a Config,
        role: &'a Role,
        version: &'a Version,
        executor: &'a dyn Executor,
        poller: &'a Poller,
        barrier: Option<Arc<Barrier>>,
    ) -> Self {
        let (strategy, note) = CutoverStrategy::for_role(role);
        if let Some(note) = note {
            tracing::warn!(role = %role.name, "{}", note);
        }

        Self {
            host: executor.host(),
            role,
            app: App::new(config, role, version),
            auditor: Auditor::new(config, Some(&role.name)),
            proxy: Proxy::new(config),
            cords_root: config.cords_root(),
            executor,
            poller,
            barrier,
            strategy,
        }
    }

    /// Replace the auditor, e.g. to pin the performer.
    pub fn with_auditor(mut self, auditor: Auditor) -> Self {
        self.auditor = auditor;
        self
    }

    /// Run the boot sequence.
    ///
    /// On failure up to and including cutover the barrier is closed (for the
    /// primary role) and the new container stopped before the error is
    /// returned. Failures while retiring the old container are logged only.
    pub async fn run(&self) -> Result<BootReport, DeployError> {
        let mut started = false;
        match self.boot(&mut started).await {
            Ok(report) => Ok(report),
            Err(err) => {
                self.abort(started).await;
                Err(err)
            }
        }
    }

    async fn boot(&self, started: &mut bool) -> Result<BootReport, DeployError> {
        let old = self.old_container_renamed_if_clashing().await?;

        self.start_new_version(old.as_ref(), started).await?;
        self.wait_until_healthy().await?;
        let opened_barrier = self.cut_over().await?;

        if let Some(old) = &old {
            self.retire(old).await;
        }
        if self.role.exposes_assets() {
            self.clean_up_assets().await;
        }

        Ok(BootReport {
            host: self.host.to_string(),
            role: self.role.name.clone(),
            container: self.app.new_container_name(),
            old_container: old,
            opened_barrier,
        })
    }

    /// Move any container already holding the target name out of the way,
    /// then capture what is currently serving.
    async fn old_container_renamed_if_clashing(
        &self,
    ) -> Result<Option<RunningContainer>, DeployError> {
        let version = self.app.version().as_str();
        let existing = self
            .executor
            .capture(
                &self.app.container_id_for_version(version),
                ExecOptions::best_effort(),
            )
            .await?;

        if !existing.is_empty() {
            let suffix: [u8; 8] = rand::random();
            let renamed = format!("{version}_replaced_{}", hex::encode(suffix));
            tracing::info!(
                host = self.host,
                "renaming container {} to {} as already deployed",
                version,
                renamed
            );
            self.audit(&format!("Renaming container {version} to {renamed}"))
                .await;
            self.executor
                .execute(
                    &self.app.rename_container(version, &renamed),
                    ExecOptions::default(),
                )
                .await?;
        }

        let running = self
            .executor
            .capture(
                &self.app.current_running_container(),
                ExecOptions::best_effort(),
            )
            .await?;
        Ok(RunningContainer::parse(&running))
    }

    async fn start_new_version(
        &self,
        old: Option<&RunningContainer>,
        started: &mut bool,
    ) -> Result<(), DeployError> {
        self.audit(&format!("Booted app version {}", self.app.version()))
            .await;

        if let Some(extract) = self
            .app
            .extract_assets(old.map(|old| old.version.as_str()))
        {
            self.executor.execute(&extract, ExecOptions::default()).await?;
        }

        let cord = if self.strategy.drains_with_cord(self.role) {
            let cord = Cord::for_role(&self.cords_root, self.app.service(), &self.role.name);
            self.executor.execute(&cord.tie(), ExecOptions::default()).await?;
            Some(cord)
        } else {
            None
        };

        let suffix: [u8; 6] = rand::random();
        let hostname = format!("{}-{}", host_name(self.host), hex::encode(suffix));

        *started = true;
        self.executor
            .execute(&self.app.run(&hostname, cord.as_ref()), ExecOptions::default())
            .await?;
        Ok(())
    }

    async fn wait_until_healthy(&self) -> Result<(), DeployError> {
        let container = self.app.new_container_name();
        self.poller
            .wait_for_healthy(|| self.container_status(&container), true)
            .await
    }

    async fn container_status(&self, container: &str) -> Result<ContainerStatus, DeployError> {
        // A container that is not there yet prints nothing; treat it as missing.
        let output = self
            .executor
            .capture(
                &self.app.status(container),
                ExecOptions::best_effort().quiet(),
            )
            .await?;
        Ok(ContainerStatus::parse(&output))
    }

    /// Returns whether this call opened the barrier.
    ///
    /// Other roles wait for the barrier before switching traffic at all;
    /// the primary role switches and then opens it.
    async fn cut_over(&self) -> Result<bool, DeployError> {
        if !self.role.primary
            && let Some(barrier) = &self.barrier
        {
            tracing::info!(host = self.host, "waiting at barrier");
            if let Err(closed) = barrier.wait().await {
                tracing::info!(host = self.host, "barrier closed, shutting down new container");
                return Err(closed.into());
            }
            tracing::info!(host = self.host, "barrier opened");
        }

        if self.strategy == CutoverStrategy::Proxy {
            self.executor
                .execute(
                    &self
                        .proxy
                        .deploy(&self.app.new_container_name(), self.role.port),
                    ExecOptions::default(),
                )
                .await?;
        }

        match &self.barrier {
            Some(barrier) if self.role.primary => {
                let opened = barrier.open();
                if opened {
                    tracing::info!(host = self.host, "opened barrier");
                }
                Ok(opened)
            }
            _ => Ok(false),
        }
    }

    /// Drain (when using a cord) and stop the previous container.
    async fn retire(&self, old: &RunningContainer) {
        if self.strategy.drains_with_cord(self.role)
            && let Err(e) = self.drain(old).await
        {
            tracing::warn!(host = self.host, container = %old.name, "drain failed: {}", e);
        }

        if let Err(e) = self
            .executor
            .execute(&self.app.stop(&old.name), ExecOptions::best_effort())
            .await
        {
            tracing::warn!(host = self.host, container = %old.name, "stop failed: {}", e);
        }
    }

    async fn drain(&self, old: &RunningContainer) -> Result<(), DeployError> {
        let dir = self
            .executor
            .capture(&self.app.cord(&old.name), ExecOptions::best_effort())
            .await?;
        if dir.is_empty() {
            return Ok(());
        }

        self.executor
            .execute(&Cord::at(dir).cut(), ExecOptions::default())
            .await?;
        self.poller
            .wait_for_unhealthy(|| self.container_status(&old.name), true)
            .await
    }

    async fn clean_up_assets(&self) {
        let Some(clean_up) = self.app.clean_up_assets() else {
            return;
        };
        if let Err(e) = self
            .executor
            .execute(&clean_up, ExecOptions::best_effort())
            .await
        {
            tracing::warn!(host = self.host, "asset clean up failed: {}", e);
        }
    }

    async fn abort(&self, started: bool) {
        if self.role.primary
            && let Some(barrier) = &self.barrier
        {
            barrier.close();
            tracing::info!(host = self.host, "closed barrier");
        }

        if started
            && let Err(e) = self
                .executor
                .execute(
                    &self.app.stop(&self.app.new_container_name()),
                    ExecOptions::best_effort(),
                )
                .await
        {
            tracing::warn!(host = self.host, "failed to stop new container: {}", e);
        }
    }

    async fn audit(&self, message: &str) {
        let record = self.auditor.record(message);
        if let Err(e) = self
            .executor
            .execute(&record, ExecOptions::default().quiet())
            .await
        {
            tracing::warn!(host = self.host, "audit failed: {}", e);
        }
    }
}

/// Hostname part of an executor's host, dropping any port.
fn host_name(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => {
            name
        }
        _ => host,
    }
}
