//! filescope - index directory trees and search their lines

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Command::Index(command) => commands::index::run(&cli, command),
        Command::Search {
            keyword,
            scope,
            regex,
            limit,
        } => commands::search::run(&cli, keyword, scope.as_deref(), *regex, *limit),
        Command::Info => commands::info::run(&cli),
        Command::Doctor => commands::doctor::run(&cli),
    }
}

/// Diagnostics go to stderr; `--verbose` wins over `FILESCOPE_LOG`
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("FILESCOPE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
