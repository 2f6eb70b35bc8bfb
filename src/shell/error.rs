// ABOUTME: Errors raised while building shell commands and env files.
// ABOUTME: Covers unresolvable secrets and values the env file format rejects.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("env file format does not support newlines in keys or values, key: {0}")]
    InvalidEnvLine(String),
}
