// ABOUTME: Application-wide error types for cutover.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::deploy::DeployError;
use crate::executor::ExecError;
use crate::shell::ShellError;
use crate::types::VersionError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("unknown destination: {0}")]
    UnknownDestination(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("could not determine version: {0}")]
    Version(String),

    #[error("invalid version: {0}")]
    InvalidVersion(#[from] VersionError),

    #[error("{failed} of {total} host(s) failed to deploy")]
    ReleaseFailed { failed: usize, total: usize },

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Remote(#[from] ExecError),

    #[error(transparent)]
    Shell(#[from] ShellError),

    #[error("SSH error: {0}")]
    Ssh(#[from] crate::ssh::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
