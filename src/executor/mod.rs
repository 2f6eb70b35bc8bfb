// ABOUTME: Remote command execution against one host.
// ABOUTME: Trait with execute/capture helpers, and its SSH-backed implementation.

mod error;
mod ssh;

pub use error::{ExecError, ExecErrorKind, NonZeroExitSnafu, TransportSnafu};
pub use ssh::SshExecutor;

use async_trait::async_trait;

use crate::shell::Command;

/// Output from a remote command execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: u32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Level at which an execution is logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    #[default]
    Info,
    Debug,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOptions {
    /// A non-zero exit is logged instead of returned as an error.
    /// Transport failures are still errors.
    pub best_effort: bool,
    pub verbosity: Verbosity,
}

impl ExecOptions {
    pub fn best_effort() -> Self {
        Self {
            best_effort: true,
            ..Self::default()
        }
    }

    pub fn quiet(self) -> Self {
        Self {
            verbosity: Verbosity::Debug,
            ..self
        }
    }
}

/// Executes commands on a single host.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Address of the host, for logs and errors.
    fn host(&self) -> &str;

    /// Run a command and return its raw output, whatever the exit code.
    async fn run(&self, command: &Command) -> Result<CommandOutput, ExecError>;

    /// Run a command for its effect.
    async fn execute(&self, command: &Command, options: ExecOptions) -> Result<(), ExecError> {
        self.checked(command, options).await.map(|_| ())
    }

    /// Run a command and return its trimmed stdout.
    async fn capture(&self, command: &Command, options: ExecOptions) -> Result<String, ExecError> {
        let output = self.checked(command, options).await?;
        Ok(output.stdout.trim().to_string())
    }

    #[doc(hidden)]
    async fn checked(
        &self,
        command: &Command,
        options: ExecOptions,
    ) -> Result<CommandOutput, ExecError> {
        match options.verbosity {
            Verbosity::Info => tracing::info!(host = self.host(), "running {}", command),
            Verbosity::Debug => tracing::debug!(host = self.host(), "running {}", command),
        }

        let output = self.run(command).await?;
        if output.success() {
            return Ok(output);
        }

        if options.best_effort {
            tracing::debug!(
                host = self.host(),
                exit_code = output.exit_code,
                "ignoring failure of {}",
                command
            );
            return Ok(output);
        }

        NonZeroExitSnafu {
            host: self.host(),
            command: command.redacted(),
            exit_code: output.exit_code,
            stderr: output.stderr,
        }
        .fail()
    }
}
