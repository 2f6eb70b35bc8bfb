// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cutover")]
#[command(about = "Zero-downtime container deploys to your own servers over SSH")]
#[command(version)]
pub struct Cli {
    /// Log every remote command
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print warnings, errors and the final result
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where to find the configuration and which destination to apply.
#[derive(Args, Clone, Default)]
pub struct ConfigArgs {
    /// Path to the configuration file (default: discovered in the current directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Target destination (defined in config)
    #[arg(short, long)]
    pub destination: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter cutover.yml in the current directory
    Init {
        #[arg(long)]
        service: Option<String>,

        #[arg(long)]
        image: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Boot a new version on every host and retire the old containers
    Deploy {
        #[command(flatten)]
        config: ConfigArgs,

        /// Version to deploy (default: the current git commit)
        #[arg(long)]
        version: Option<String>,
    },

    /// Manage the env files containers are started with
    Env {
        #[command(subcommand)]
        command: EnvCommands,
    },

    /// Print the version that would be deployed
    Version {
        #[arg(long)]
        version: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum EnvCommands {
    /// Write each role's env file, secrets included, to its hosts
    Push {
        #[command(flatten)]
        config: ConfigArgs,
    },
}
