// ABOUTME: Remote execution errors with SNAFU context selectors.
// ABOUTME: Distinguishes failing commands from transport failures.

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ExecError {
    /// The command ran and exited non-zero.
    #[snafu(display("`{command}` exited with {exit_code} on {host}: {}", stderr.trim()))]
    NonZeroExit {
        host: String,
        command: String,
        exit_code: u32,
        stderr: String,
    },

    /// The command could not be run or its result was lost.
    #[snafu(display("could not run `{command}` on {host}: {source}"))]
    Transport {
        host: String,
        command: String,
        source: crate::ssh::Error,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecErrorKind {
    NonZeroExit,
    Transport,
}

impl ExecError {
    pub fn kind(&self) -> ExecErrorKind {
        match self {
            ExecError::NonZeroExit { .. } => ExecErrorKind::NonZeroExit,
            ExecError::Transport { .. } => ExecErrorKind::Transport,
        }
    }

    pub fn host(&self) -> &str {
        match self {
            ExecError::NonZeroExit { host, .. } | ExecError::Transport { host, .. } => host,
        }
    }

    /// Exit code, when the command ran at all.
    pub fn exit_code(&self) -> Option<u32> {
        match self {
            ExecError::NonZeroExit { exit_code, .. } => Some(*exit_code),
            ExecError::Transport { .. } => None,
        }
    }
}
