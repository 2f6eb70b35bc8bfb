// ABOUTME: Release-wide readiness barrier between primary and other hosts.
// ABOUTME: Opens once the primary role is healthy somewhere, closes on abort.

use std::fmt;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierStatus {
    Pending,
    Open,
    Closed,
}

impl fmt::Display for BarrierStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BarrierStatus::Pending => "pending",
            BarrierStatus::Open => "open",
            BarrierStatus::Closed => "closed",
        })
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("barrier closed: the primary role failed to boot")]
pub struct BarrierClosed;

/// Gate that non-primary hosts wait on before cutting over.
///
/// `Pending` moves to `Open` at most once. `Closed` is terminal and can be
/// reached from any state.
#[derive(Debug)]
pub struct Barrier {
    status: watch::Sender<BarrierStatus>,
}

impl Default for Barrier {
    fn default() -> Self {
        Self::new()
    }
}

impl Barrier {
    pub fn new() -> Self {
        let (status, _) = watch::channel(BarrierStatus::Pending);
        Self { status }
    }

    /// Open the barrier. Returns true only for the call that opened it.
    pub fn open(&self) -> bool {
        self.status.send_if_modified(|status| {
            if *status == BarrierStatus::Pending {
                *status = BarrierStatus::Open;
                true
            } else {
                false
            }
        })
    }

    /// Close the barrier, failing every current and future waiter.
    pub fn close(&self) {
        self.status.send_replace(BarrierStatus::Closed);
    }

    /// Wait until the barrier opens.
    pub async fn wait(&self) -> Result<(), BarrierClosed> {
        let mut rx = self.status.subscribe();
        let status = rx
            .wait_for(|status| *status != BarrierStatus::Pending)
            .await
            .map(|status| *status)
            // The sender lives in self, so the channel cannot close under us.
            .unwrap_or(BarrierStatus::Closed);

        match status {
            BarrierStatus::Open => Ok(()),
            _ => Err(BarrierClosed),
        }
    }

    pub fn status(&self) -> BarrierStatus {
        *self.status.borrow()
    }
}
