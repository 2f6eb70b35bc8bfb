// ABOUTME: Drain signal shared between a container and the deployer.
// ABOUTME: A host directory holding a marker file the health check depends on.

use crate::shell::Command;

/// Where cord directories are mounted inside app containers.
pub const CONTAINER_CORD_PATH: &str = "/tmp/cutover-cord";

const CORD_FILE: &str = "cord";

/// A cord directory on the host.
///
/// While the `cord` file exists the container's health check can pass.
/// Cutting the cord removes it, so the container turns unhealthy and load
/// balancers stop routing to it before it is stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cord {
    dir: String,
}

impl Cord {
    /// A fresh cord for a new container of `service`/`role`.
    pub fn for_role(root: &str, service: &str, role: &str) -> Self {
        let suffix: [u8; 8] = rand::random();
        Self::at(format!(
            "{}/{}-{}-{}",
            root.trim_end_matches('/'),
            service,
            role,
            hex::encode(suffix)
        ))
    }

    /// The cord at an existing directory, such as one read from a
    /// container's mounts.
    pub fn at(dir: impl Into<String>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &str {
        &self.dir
    }

    pub fn file(&self) -> String {
        format!("{}/{}", self.dir, CORD_FILE)
    }

    /// `--volume` value mounting the cord into a container.
    pub fn volume(&self) -> String {
        format!("{}:{}", self.dir, CONTAINER_CORD_PATH)
    }

    pub fn tie(&self) -> Command {
        Command::new(["mkdir", "-p", self.dir.as_str()])
            .and(Command::new(["touch", self.file().as_str()]))
    }

    pub fn cut(&self) -> Command {
        Command::new(["rm", "-r", self.dir.as_str()])
    }

    /// Health check fragment that fails once the cord is cut.
    pub fn health_check() -> String {
        format!("(cat {CONTAINER_CORD_PATH}/{CORD_FILE} > /dev/null || exit 1)")
    }
}
