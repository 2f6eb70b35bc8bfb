// ABOUTME: Command module aggregator for the cutover CLI.
// ABOUTME: Re-exports the deploy, env and version command handlers.

mod connect;
mod deploy;
mod env;
mod version;

pub use deploy::deploy;
pub use env::env_push;
pub use version::{print_version, resolve_version};

use crate::cli::ConfigArgs;
use cutover::config::Config;
use cutover::error::Result;

/// Load the configuration and apply the requested destination.
pub fn load_config(args: &ConfigArgs) -> Result<Config> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::discover(&std::env::current_dir()?)?,
    };

    match &args.destination {
        Some(destination) => config.for_destination(destination),
        None => Ok(config),
    }
}
