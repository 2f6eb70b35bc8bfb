// ABOUTME: Container health polling used to confirm boots and drains.
// ABOUTME: Exposes the retrying poller, status parsing, and its error type.

mod poller;
mod status;

pub use poller::Poller;
pub use status::ContainerStatus;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HealthcheckError {
    /// The status check never satisfied the predicate within the retry budget.
    #[error("{expected} not reached after {attempts} attempts (last status: {last})")]
    Exhausted {
        expected: &'static str,
        attempts: u32,
        last: ContainerStatus,
    },

    /// The container reported itself unhealthy while booting.
    #[error("container is unhealthy")]
    Unhealthy,
}
