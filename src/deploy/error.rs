// ABOUTME: Error types for a host's boot sequence.
// ABOUTME: Health check, barrier, remote execution and command-building failures.

use crate::executor::ExecError;
use crate::healthcheck::HealthcheckError;
use crate::shell::ShellError;

use super::BarrierClosed;

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The new container never became healthy, or the old one never drained.
    #[error("health check failed: {0}")]
    Healthcheck(#[from] HealthcheckError),

    /// Another host of the primary role failed while this one waited.
    #[error(transparent)]
    BarrierClosed(#[from] BarrierClosed),

    #[error(transparent)]
    Remote(#[from] ExecError),

    #[error(transparent)]
    Shell(#[from] ShellError),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    Healthcheck,
    BarrierClosed,
    Remote,
    Shell,
}

impl DeployError {
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::Healthcheck(_) => DeployErrorKind::Healthcheck,
            DeployError::BarrierClosed(_) => DeployErrorKind::BarrierClosed,
            DeployError::Remote(_) => DeployErrorKind::Remote,
            DeployError::Shell(_) => DeployErrorKind::Shell,
        }
    }
}
