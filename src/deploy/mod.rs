// ABOUTME: Zero-downtime release of a new version across hosts.
// ABOUTME: Per-host boot sequence, cutover strategies, barrier and release driver.

mod barrier;
mod boot;
mod error;
mod release;
mod strategy;

pub use barrier::{Barrier, BarrierClosed, BarrierStatus};
pub use boot::{Boot, BootReport};
pub use error::{DeployError, DeployErrorKind};
pub use release::{HostOutcome, Release, ReleaseReport, Target};
pub use strategy::CutoverStrategy;
