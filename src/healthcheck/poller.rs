// ABOUTME: Retrying status poller with a fixed interval and bounded attempts.
// ABOUTME: Serves both new-container confirmation and old-container drain checks.

use std::future::Future;
use std::time::Duration;

use super::{ContainerStatus, HealthcheckError};
use crate::config::HealthcheckConfig;

/// Polls a caller-supplied status check until a predicate holds.
#[derive(Debug, Clone)]
pub struct Poller {
    max_attempts: u32,
    interval: Duration,
    readiness_delay: Duration,
}

impl Poller {
    pub fn new(max_attempts: u32, interval: Duration, readiness_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
            readiness_delay,
        }
    }

    pub fn from_config(config: &HealthcheckConfig) -> Self {
        Self::new(
            config.max_attempts,
            config.interval,
            config.readiness_delay,
        )
    }

    /// Wait until the check reports `healthy`, or `running` for containers
    /// without a health check.
    ///
    /// An `unhealthy` report fails immediately: the runtime only reports it
    /// after its own health check retries are spent. Status errors are
    /// returned unchanged.
    pub async fn wait_for_healthy<F, Fut, E>(&self, status_of: F, pause_after_ready: bool) -> Result<(), E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<ContainerStatus, E>>,
        E: From<HealthcheckError>,
    {
        self.poll("healthy", status_of, pause_after_ready, |status| match status {
            ContainerStatus::Unhealthy => Err(HealthcheckError::Unhealthy),
            status => Ok(status.is_ready()),
        })
        .await
    }

    /// Wait until the check reports anything other than `healthy`.
    pub async fn wait_for_unhealthy<F, Fut, E>(
        &self,
        status_of: F,
        pause_after_ready: bool,
    ) -> Result<(), E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<ContainerStatus, E>>,
        E: From<HealthcheckError>,
    {
        self.poll("unhealthy", status_of, pause_after_ready, |status| {
            Ok(*status != ContainerStatus::Healthy)
        })
        .await
    }

    async fn poll<F, Fut, E>(
        &self,
        expected: &'static str,
        mut status_of: F,
        pause_after_ready: bool,
        satisfied: impl Fn(&ContainerStatus) -> Result<bool, HealthcheckError>,
    ) -> Result<(), E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<ContainerStatus, E>>,
        E: From<HealthcheckError>,
    {
        let mut last = ContainerStatus::Missing;

        for attempt in 1..=self.max_attempts {
            let status = status_of().await?;

            if satisfied(&status)? {
                tracing::info!(%status, attempt, "container is {}", expected);
                if pause_after_ready && !self.readiness_delay.is_zero() {
                    tokio::time::sleep(self.readiness_delay).await;
                }
                return Ok(());
            }

            if attempt < self.max_attempts {
                tracing::info!(
                    "container not {} ({}), retrying in {:?} (attempt {}/{})",
                    expected,
                    status,
                    self.interval,
                    attempt,
                    self.max_attempts
                );
                tokio::time::sleep(self.interval).await;
            }
            last = status;
        }

        Err(HealthcheckError::Exhausted {
            expected,
            attempts: self.max_attempts,
            last,
        }
        .into())
    }
}
