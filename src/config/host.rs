// ABOUTME: Host addresses from the servers section of cutover.yml.
// ABOUTME: Parses "host", "user@host", "host:port" and "user@host:port".

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// SSH address of a target host. User and port fall back to the `ssh`
/// section when absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "RawHost")]
pub struct HostAddress {
    host: String,
    user: Option<String>,
    port: Option<u16>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawHost {
    Short(String),
    Detailed {
        host: String,
        #[serde(default)]
        user: Option<String>,
        #[serde(default)]
        port: Option<u16>,
    },
}

impl TryFrom<RawHost> for HostAddress {
    type Error = String;

    fn try_from(raw: RawHost) -> Result<Self, Self::Error> {
        match raw {
            RawHost::Short(s) => HostAddress::parse(&s),
            RawHost::Detailed { host, user, port } => {
                let mut address = HostAddress::parse(&host)?;
                address.user = user.or(address.user);
                address.port = port.or(address.port);
                Ok(address)
            }
        }
    }
}

impl HostAddress {
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("host address cannot be empty".to_string());
        }

        let (user, rest) = match s.split_once('@') {
            Some((user, _)) if user.is_empty() => {
                return Err(format!("empty user in host address: {s}"));
            }
            Some((user, rest)) => (Some(user.to_string()), rest),
            None => (None, s),
        };

        // Bare IPv6 addresses carry several colons and no port.
        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) if !host.contains(':') => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| format!("invalid port: {port}"))?;
                (host, Some(port))
            }
            _ => (rest, None),
        };

        if host.is_empty() {
            return Err("hostname cannot be empty".to_string());
        }

        Ok(HostAddress {
            host: host.to_string(),
            user,
            port,
        })
    }

    /// Hostname or IP, without user or port.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

impl FromStr for HostAddress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HostAddress::parse(s)
    }
}

impl fmt::Display for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        Ok(())
    }
}
