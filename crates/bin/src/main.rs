//! kvdoc command shell.
//!
//! Runs the `AM.*` command family against documents kept in a local state
//! file, standing in for a key-value server host.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod output;
mod state;

use cli::{Cli, Commands};

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kvdoc=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => commands::shell::run(&cli.state, cli.format)?,
        Commands::Exec(args) => {
            if !commands::exec::run(&args, &cli.state, cli.format)? {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
