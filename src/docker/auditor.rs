// ABOUTME: Audit log commands appending deploy events on each host.
// ABOUTME: Lines carry a UTC timestamp, the performer and the role.

use chrono::{SecondsFormat, Utc};

use crate::config::Config;
use crate::shell::{Command, escape_shell_value};

#[derive(Debug, Clone)]
pub struct Auditor {
    log_dir: String,
    log_file: String,
    performer: String,
    role: Option<String>,
}

impl Auditor {
    pub fn new(config: &Config, role: Option<&str>) -> Self {
        let mut name = config.service.to_string();
        if let Some(destination) = &config.destination {
            name.push('-');
            name.push_str(destination);
        }
        Self {
            log_dir: config.run_directory.clone(),
            log_file: format!("{}/{}-audit.log", config.run_directory, name),
            performer: performer(),
            role: role.map(str::to_string),
        }
    }

    pub fn with_performer(mut self, performer: impl Into<String>) -> Self {
        self.performer = performer.into();
        self
    }

    pub fn log_file(&self) -> &str {
        &self.log_file
    }

    pub fn record(&self, message: &str) -> Command {
        self.record_at(message, &Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    fn record_at(&self, message: &str, timestamp: &str) -> Command {
        let mut line = format!("[{timestamp}] [{}]", self.performer);
        if let Some(role) = &self.role {
            line.push_str(&format!(" [{role}]"));
        }
        line.push(' ');
        line.push_str(message);

        Command::new(["mkdir", "-p", self.log_dir.as_str()]).and(
            Command::new(["echo"])
                .arg(escape_shell_value(&line))
                .args([">>", self.log_file.as_str()]),
        )
    }
}

/// `user@machine` of whoever runs the deploy.
fn performer() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());
    let machine = gethostname::gethostname().to_string_lossy().into_owned();
    format!("{user}@{machine}")
}
