// ABOUTME: Configuration types and parsing for cutover.yml.
// ABOUTME: Handles YAML parsing, role resolution, and destination merging.

mod healthcheck;
mod host;
mod role;

pub use healthcheck::HealthcheckConfig;
pub use host::HostAddress;
pub use role::{DEFAULT_PRIMARY_ROLE, Role, RoleConfig};

use crate::error::{Error, Result};
use crate::shell::EnvSpec;
use crate::ssh::SessionConfig;
use crate::types::{ImageName, ServiceName};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "cutover.yml";
pub const CONFIG_FILENAME_ALT: &str = "cutover.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".cutover/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceName,

    pub image: ImageName,

    #[serde(deserialize_with = "role::deserialize_servers")]
    pub servers: BTreeMap<String, RoleConfig>,

    #[serde(default = "default_primary_role")]
    pub primary_role: String,

    #[serde(default)]
    pub env: EnvSpec,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub healthcheck: HealthcheckConfig,

    #[serde(default)]
    pub boot: BootConfig,

    #[serde(default)]
    pub ssh: SshConfig,

    #[serde(default)]
    pub proxy: ProxyConfig,

    /// Directory on each host, relative to the SSH user's home, holding
    /// cords, env files, assets and the audit log.
    #[serde(default = "default_run_directory")]
    pub run_directory: String,

    #[serde(default)]
    pub destinations: HashMap<String, Destination>,

    /// Set by [`Config::for_destination`].
    #[serde(skip)]
    pub destination: Option<String>,
}

fn default_primary_role() -> String {
    DEFAULT_PRIMARY_ROLE.to_string()
}

fn default_run_directory() -> String {
    ".cutover".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Destination {
    #[serde(default, deserialize_with = "role::deserialize_servers_option")]
    pub servers: Option<BTreeMap<String, RoleConfig>>,

    #[serde(default)]
    pub env: Option<EnvSpec>,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub healthcheck: Option<HealthcheckConfig>,
}

/// How many hosts boot at once.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootConfig {
    #[serde(default)]
    pub limit: Option<BootLimit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawLimit")]
pub enum BootLimit {
    Hosts(usize),
    Percent(u8),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLimit {
    Count(usize),
    Text(String),
}

impl TryFrom<RawLimit> for BootLimit {
    type Error = String;

    fn try_from(raw: RawLimit) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawLimit::Count(0) => Err("boot limit must be at least 1".to_string()),
            RawLimit::Count(n) => Ok(BootLimit::Hosts(n)),
            RawLimit::Text(s) => {
                let percent = s
                    .trim()
                    .strip_suffix('%')
                    .and_then(|n| n.trim().parse::<u8>().ok())
                    .filter(|n| (1..=100).contains(n))
                    .ok_or_else(|| format!("invalid boot limit: {s}"))?;
                Ok(BootLimit::Percent(percent))
            }
        }
    }
}

impl BootConfig {
    /// Number of hosts allowed to boot concurrently out of `total`.
    pub fn concurrency(&self, total: usize) -> usize {
        let limit = match self.limit {
            None => total,
            Some(BootLimit::Hosts(n)) => n,
            Some(BootLimit::Percent(p)) => total * usize::from(p) / 100,
        };
        limit.clamp(1, total.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SshConfig {
    #[serde(default = "default_ssh_user")]
    pub user: String,

    #[serde(default = "default_ssh_port")]
    pub port: u16,

    #[serde(default)]
    pub key_path: Option<PathBuf>,

    #[serde(default)]
    pub known_hosts: Option<PathBuf>,

    #[serde(default = "default_trust_first_connection")]
    pub trust_first_connection: bool,

    #[serde(default = "default_command_timeout", with = "humantime_serde")]
    pub command_timeout: Duration,
}

fn default_ssh_user() -> String {
    "root".to_string()
}

fn default_ssh_port() -> u16 {
    22
}

fn default_trust_first_connection() -> bool {
    true
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(300)
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            user: default_ssh_user(),
            port: default_ssh_port(),
            key_path: None,
            known_hosts: None,
            trust_first_connection: default_trust_first_connection(),
            command_timeout: default_command_timeout(),
        }
    }
}

impl SshConfig {
    /// Session settings for `address`, which may override user and port.
    pub fn session_config(&self, address: &HostAddress) -> SessionConfig {
        let mut session = SessionConfig::new(
            address.host(),
            address.user().unwrap_or(&self.user),
        )
        .port(address.port().unwrap_or(self.port))
        .trust_on_first_use(self.trust_first_connection)
        .command_timeout(self.command_timeout);

        if let Some(key) = &self.key_path {
            session = session.key_path(key);
        }
        if let Some(known_hosts) = &self.known_hosts {
            session = session.known_hosts_path(known_hosts);
        }
        session
    }
}

/// The reverse proxy container used by roles with `proxy: true`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_proxy_container")]
    pub container: String,

    #[serde(default = "default_proxy_deploy_timeout", with = "humantime_serde")]
    pub deploy_timeout: Duration,
}

fn default_proxy_container() -> String {
    "cutover-proxy".to_string()
}

fn default_proxy_deploy_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            container: default_proxy_container(),
            deploy_timeout: default_proxy_deploy_timeout(),
        }
    }
}

/// A target host together with the role it runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Host {
    pub address: HostAddress,
    pub role: String,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        candidates
            .iter()
            .find(|path| path.exists())
            .map(|path| Self::load(path))
            .unwrap_or_else(|| Err(Error::ConfigNotFound(dir.to_path_buf())))
    }

    pub fn for_destination(&self, name: &str) -> Result<Config> {
        let dest = self
            .destinations
            .get(name)
            .ok_or_else(|| Error::UnknownDestination(name.to_string()))?;

        let mut merged = self.clone();
        merged.destination = Some(name.to_string());

        if let Some(servers) = &dest.servers {
            merged.servers = servers.clone();
        }
        if let Some(env) = &dest.env {
            merged.env = merged.env.merged(env);
        }
        merged
            .labels
            .extend(dest.labels.iter().map(|(k, v)| (k.clone(), v.clone())));
        if let Some(healthcheck) = &dest.healthcheck {
            merged.healthcheck = healthcheck.clone();
        }

        merged.validate()?;
        Ok(merged)
    }

    fn validate(&self) -> Result<()> {
        if !self.servers.contains_key(&self.primary_role) {
            return Err(Error::InvalidConfig(format!(
                "primary role {} is not defined under servers",
                self.primary_role
            )));
        }
        if self.run_directory.trim().is_empty() {
            return Err(Error::InvalidConfig("run_directory cannot be empty".to_string()));
        }
        self.roles().map(|_| ())
    }

    /// Resolved roles, primary role first.
    pub fn roles(&self) -> Result<Vec<Role>> {
        let mut roles = self
            .servers
            .iter()
            .map(|(name, config)| Role::resolve(name, config, &self.primary_role, &self.env))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::InvalidConfig)?;
        roles.sort_by_key(|role| !role.primary);
        Ok(roles)
    }

    pub fn role(&self, name: &str) -> Result<Role> {
        self.roles()?
            .into_iter()
            .find(|role| role.name == name)
            .ok_or_else(|| Error::InvalidConfig(format!("unknown role: {name}")))
    }

    /// Every (host, role) pair, primary role hosts first.
    pub fn hosts(&self) -> Result<Vec<Host>> {
        Ok(self
            .roles()?
            .into_iter()
            .flat_map(|role| {
                role.hosts
                    .into_iter()
                    .map(move |address| Host {
                        address,
                        role: role.name.clone(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect())
    }

    /// Directory holding cord markers on each host.
    pub fn cords_root(&self) -> String {
        format!("{}/cords", self.run_directory)
    }

    /// Minimal single-host config, the same one `cutover init` writes.
    pub fn template() -> Self {
        serde_yaml::from_str(&template_yaml("my-app", "my-registry/my-app"))
            .expect("built-in template is valid")
    }
}

/// Write a starter cutover.yml into `dir`.
pub fn init_config(
    dir: &Path,
    service: Option<&str>,
    image: Option<&str>,
    force: bool,
) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let service = ServiceName::new(service.unwrap_or("my-app"))
        .map_err(|e| Error::InvalidConfig(e.to_string()))?;
    let image = ImageName::new(image.unwrap_or("my-registry/my-app"))
        .map_err(|e| Error::InvalidConfig(e.to_string()))?;

    std::fs::write(&config_path, template_yaml(service.as_str(), image.as_str()))?;
    Ok(config_path)
}

fn template_yaml(service: &str, image: &str) -> String {
    format!(
        r#"service: {service}
image: {image}
servers:
  web:
    hosts:
      - server.example.com
    port: 3000
env:
  clear: {{}}
  secret: []
healthcheck:
  path: /up
  interval: 1s
  max_attempts: 7
ssh:
  user: root
"#
    )
}
