// ABOUTME: Entry point for the cutover CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands, EnvCommands};
use cutover::config;
use cutover::error::Result;
use cutover::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flags
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match (cli.verbose, cli.quiet) {
            (true, _) => "debug",
            (_, true) => "warn",
            _ => "info",
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let output = Output::new(if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    });

    match cli.command {
        Commands::Init {
            service,
            image,
            force,
        } => {
            let cwd = env::current_dir()?;
            let path = config::init_config(&cwd, service.as_deref(), image.as_deref(), force)?;
            output.success(&format!("Created {}", path.display()));
            Ok(())
        }
        Commands::Deploy { config, version } => {
            let config = commands::load_config(&config)?;
            let version = commands::resolve_version(version.as_deref()).await?;
            commands::deploy(config, version, output).await
        }
        Commands::Env {
            command: EnvCommands::Push { config },
        } => {
            let config = commands::load_config(&config)?;
            let version = commands::resolve_version(None).await?;
            commands::env_push(config, version, output).await
        }
        Commands::Version { version } => commands::print_version(version.as_deref()).await,
    }
}
