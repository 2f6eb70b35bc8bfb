// ABOUTME: Docker command builders for app containers, the audit log and the proxy.
// ABOUTME: Builders only produce shell commands; executors run them.

mod app;
mod auditor;
mod proxy;

pub use app::{App, RunningContainer};
pub use auditor::Auditor;
pub use proxy::Proxy;

use crate::shell::{Command, Value};

pub(crate) fn docker<I, T>(args: I) -> Command
where
    I: IntoIterator<Item = T>,
    T: Into<Value>,
{
    Command::new(["docker"]).args(args)
}

/// `docker container ls` matching exactly one container name, ids only.
pub(crate) fn container_id_named(name: &str) -> Command {
    docker([
        "container".to_string(),
        "ls".to_string(),
        "--all".to_string(),
        "--filter".to_string(),
        format!("name=^{name}$"),
        "--quiet".to_string(),
    ])
}
