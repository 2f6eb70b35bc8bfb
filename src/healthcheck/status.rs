// ABOUTME: Container status as reported by `docker inspect`.
// ABOUTME: Health status when a health check exists, else the run state.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerStatus {
    Healthy,
    Unhealthy,
    Starting,
    /// Running without a health check.
    Running,
    /// No container matched.
    Missing,
    Other(String),
}

impl ContainerStatus {
    pub fn parse(output: &str) -> Self {
        match output.trim() {
            "healthy" => ContainerStatus::Healthy,
            "unhealthy" => ContainerStatus::Unhealthy,
            "starting" => ContainerStatus::Starting,
            "running" => ContainerStatus::Running,
            "" => ContainerStatus::Missing,
            other => ContainerStatus::Other(other.to_string()),
        }
    }

    /// Ready to take traffic.
    pub fn is_ready(&self) -> bool {
        matches!(self, ContainerStatus::Healthy | ContainerStatus::Running)
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerStatus::Healthy => f.write_str("healthy"),
            ContainerStatus::Unhealthy => f.write_str("unhealthy"),
            ContainerStatus::Starting => f.write_str("starting"),
            ContainerStatus::Running => f.write_str("running"),
            ContainerStatus::Missing => f.write_str("missing"),
            ContainerStatus::Other(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inspect_output() {
        assert_eq!(ContainerStatus::parse("healthy\n"), ContainerStatus::Healthy);
        assert_eq!(ContainerStatus::parse("running"), ContainerStatus::Running);
        assert_eq!(ContainerStatus::parse(""), ContainerStatus::Missing);
        assert_eq!(
            ContainerStatus::parse("exited"),
            ContainerStatus::Other("exited".to_string())
        );
    }

    #[test]
    fn running_without_healthcheck_is_ready() {
        assert!(ContainerStatus::Running.is_ready());
        assert!(ContainerStatus::Healthy.is_ready());
        assert!(!ContainerStatus::Starting.is_ready());
    }
}
