// ABOUTME: Executor over an SSH session.
// ABOUTME: Sends the unredacted command; errors carry only the redacted form.

use async_trait::async_trait;
use snafu::ResultExt;

use super::{CommandOutput, ExecError, Executor, TransportSnafu};
use crate::shell::Command;
use crate::ssh::Session;

#[derive(Debug)]
pub struct SshExecutor {
    host: String,
    session: Session,
}

impl SshExecutor {
    pub fn new(host: impl Into<String>, session: Session) -> Self {
        Self {
            host: host.into(),
            session,
        }
    }

    pub async fn disconnect(self) -> Result<(), crate::ssh::Error> {
        self.session.disconnect().await
    }
}

#[async_trait]
impl Executor for SshExecutor {
    fn host(&self) -> &str {
        &self.host
    }

    async fn run(&self, command: &Command) -> Result<CommandOutput, ExecError> {
        self.session
            .exec(&command.to_shell())
            .await
            .context(TransportSnafu {
                host: &self.host,
                command: command.redacted(),
            })
    }
}
