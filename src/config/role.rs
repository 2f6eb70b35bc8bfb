// ABOUTME: Role configuration and the resolved Role record used at deploy time.
// ABOUTME: Capabilities (cord, proxy, assets, primary) are explicit fields.

use nonempty::NonEmpty;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

use super::HostAddress;
use crate::shell::{EnvSpec, Opt};

pub const DEFAULT_PRIMARY_ROLE: &str = "web";

/// A role entry under `servers`, as written in YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleConfig {
    #[serde(deserialize_with = "deserialize_hosts")]
    pub hosts: NonEmpty<HostAddress>,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Run the container with a health check. Defaults to on for the
    /// primary role and for proxied roles.
    #[serde(default)]
    pub healthcheck: Option<bool>,

    /// Drain through a cord before stopping. Defaults to on for roles with
    /// a health check that are not behind the proxy.
    #[serde(default)]
    pub cord: Option<bool>,

    #[serde(default)]
    pub proxy: bool,

    /// Path inside the image holding build assets to share across versions.
    #[serde(default)]
    pub assets: Option<String>,

    #[serde(default)]
    pub cmd: Option<String>,

    #[serde(default)]
    pub options: BTreeMap<String, Opt>,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub env: EnvSpec,
}

fn default_port() -> u16 {
    3000
}

impl RoleConfig {
    pub fn with_hosts(hosts: NonEmpty<HostAddress>) -> Self {
        Self {
            hosts,
            port: default_port(),
            healthcheck: None,
            cord: None,
            proxy: false,
            assets: None,
            cmd: None,
            options: BTreeMap::new(),
            labels: BTreeMap::new(),
            env: EnvSpec::default(),
        }
    }
}

/// A role ready for deployment: defaults applied, env merged with the
/// service-wide env.
#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    pub name: String,
    pub hosts: Vec<HostAddress>,
    pub primary: bool,
    pub port: u16,
    pub healthcheck: bool,
    pub cord: bool,
    pub proxy: bool,
    pub assets: Option<String>,
    pub cmd: Option<String>,
    pub options: BTreeMap<String, Opt>,
    pub labels: BTreeMap<String, String>,
    pub env: EnvSpec,
}

impl Role {
    pub(super) fn resolve(
        name: &str,
        config: &RoleConfig,
        primary_role: &str,
        service_env: &EnvSpec,
    ) -> Result<Self, String> {
        let primary = name == primary_role;
        let healthcheck = config.healthcheck.unwrap_or(primary || config.proxy);
        let cord = config.cord.unwrap_or(healthcheck && !config.proxy);

        if cord && !healthcheck {
            return Err(format!(
                "role {name}: cord requires the health check to be enabled"
            ));
        }

        Ok(Role {
            name: name.to_string(),
            hosts: config.hosts.iter().cloned().collect(),
            primary,
            port: config.port,
            healthcheck,
            cord,
            proxy: config.proxy,
            assets: config.assets.clone(),
            cmd: config.cmd.clone(),
            options: config.options.clone(),
            labels: config.labels.clone(),
            env: service_env.merged(&config.env),
        })
    }

    pub fn exposes_assets(&self) -> bool {
        self.assets.is_some()
    }
}

/// A role entry is either a bare host list or a full mapping.
#[derive(Deserialize)]
#[serde(untagged)]
enum RoleEntry {
    Hosts(#[serde(deserialize_with = "deserialize_hosts")] NonEmpty<HostAddress>),
    Detailed(RoleConfig),
}

/// `servers` is either a host list (one role, `web`) or a role mapping.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawServers {
    Hosts(#[serde(deserialize_with = "deserialize_hosts")] NonEmpty<HostAddress>),
    Roles(BTreeMap<String, RoleEntry>),
}

pub(super) fn deserialize_servers<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, RoleConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    let servers = match RawServers::deserialize(deserializer)? {
        RawServers::Hosts(hosts) => BTreeMap::from([(
            DEFAULT_PRIMARY_ROLE.to_string(),
            RoleConfig::with_hosts(hosts),
        )]),
        RawServers::Roles(roles) => roles
            .into_iter()
            .map(|(name, entry)| {
                let config = match entry {
                    RoleEntry::Hosts(hosts) => RoleConfig::with_hosts(hosts),
                    RoleEntry::Detailed(config) => config,
                };
                (name, config)
            })
            .collect(),
    };

    if servers.is_empty() {
        return Err(serde::de::Error::custom("at least one role is required"));
    }
    Ok(servers)
}

pub(super) fn deserialize_servers_option<'de, D>(
    deserializer: D,
) -> Result<Option<BTreeMap<String, RoleConfig>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_servers")] BTreeMap<String, RoleConfig>);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(servers)| servers))
}

fn deserialize_hosts<'de, D>(deserializer: D) -> Result<NonEmpty<HostAddress>, D::Error>
where
    D: Deserializer<'de>,
{
    let hosts: Vec<HostAddress> = Vec::deserialize(deserializer)?;
    NonEmpty::from_vec(hosts).ok_or_else(|| serde::de::Error::custom("at least one host is required"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(yaml: &str, name: &str) -> Result<Role, String> {
        let config: RoleConfig = serde_yaml::from_str(yaml).unwrap();
        Role::resolve(name, &config, DEFAULT_PRIMARY_ROLE, &EnvSpec::default())
    }

    #[test]
    fn primary_role_defaults_to_healthcheck_and_cord() {
        let web = role("hosts: [1.1.1.1]", "web").unwrap();
        assert!(web.primary);
        assert!(web.healthcheck);
        assert!(web.cord);
        assert!(!web.proxy);
        assert_eq!(web.port, 3000);
    }

    #[test]
    fn secondary_role_defaults_to_neither() {
        let workers = role("hosts: [1.1.1.3]\ncmd: bin/jobs", "workers").unwrap();
        assert!(!workers.primary);
        assert!(!workers.healthcheck);
        assert!(!workers.cord);
        assert_eq!(workers.cmd.as_deref(), Some("bin/jobs"));
    }

    #[test]
    fn proxied_role_does_not_use_a_cord() {
        let web = role("hosts: [1.1.1.1]\nproxy: true", "web").unwrap();
        assert!(web.healthcheck);
        assert!(!web.cord);
    }

    #[test]
    fn cord_without_healthcheck_is_rejected() {
        let err = role("hosts: [1.1.1.1]\ncord: true", "workers").unwrap_err();
        assert!(err.contains("cord requires"));
    }

    #[test]
    fn empty_host_list_is_rejected() {
        assert!(serde_yaml::from_str::<RoleConfig>("hosts: []").is_err());
    }

    #[test]
    fn role_env_layers_over_service_env() {
        let config: RoleConfig =
            serde_yaml::from_str("hosts: [1.1.1.1]\nenv:\n  clear:\n    QUEUE: default\n").unwrap();
        let service_env: EnvSpec = serde_yaml::from_str("clear:\n  RAILS_ENV: production\n").unwrap();
        let role = Role::resolve("workers", &config, "web", &service_env).unwrap();
        assert_eq!(role.env.clear.len(), 2);
    }
}
