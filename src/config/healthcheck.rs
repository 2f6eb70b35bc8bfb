// ABOUTME: Container health check configuration.
// ABOUTME: Check command plus the poller's pacing, with defaults for web apps.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthcheckConfig {
    /// Command run inside the container. Defaults to a curl against `path`.
    #[serde(default)]
    pub cmd: Option<String>,

    #[serde(default = "default_path")]
    pub path: String,

    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause after the new container first reports healthy, giving load
    /// balancers time to pick it up.
    #[serde(default = "default_readiness_delay", with = "humantime_serde")]
    pub readiness_delay: Duration,
}

fn default_path() -> String {
    "/up".to_string()
}

fn default_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_max_attempts() -> u32 {
    7
}

fn default_readiness_delay() -> Duration {
    Duration::from_secs(7)
}

impl Default for HealthcheckConfig {
    fn default() -> Self {
        Self {
            cmd: None,
            path: default_path(),
            interval: default_interval(),
            max_attempts: default_max_attempts(),
            readiness_delay: default_readiness_delay(),
        }
    }
}

impl HealthcheckConfig {
    /// The in-container health command for an app listening on `port`.
    pub fn command_for(&self, port: u16) -> String {
        match &self.cmd {
            Some(cmd) => cmd.clone(),
            None => {
                let path = self.path.trim_start_matches('/');
                format!("curl -f http://localhost:{port}/{path} || exit 1")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config: HealthcheckConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, HealthcheckConfig::default());
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.max_attempts, 7);
        assert_eq!(config.readiness_delay, Duration::from_secs(7));
    }

    #[test]
    fn default_command_curls_the_path() {
        let config = HealthcheckConfig::default();
        assert_eq!(
            config.command_for(3000),
            "curl -f http://localhost:3000/up || exit 1"
        );
    }

    #[test]
    fn explicit_command_wins() {
        let config: HealthcheckConfig =
            serde_yaml::from_str("cmd: bin/check\ninterval: 250ms\n").unwrap();
        assert_eq!(config.command_for(3000), "bin/check");
        assert_eq!(config.interval, Duration::from_millis(250));
    }
}
