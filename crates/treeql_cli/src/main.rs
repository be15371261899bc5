//! Main entry point for the treeql CLI.

use clap::Parser;
use treeql_cli::Cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "treeql=debug"
    } else if cli.quiet {
        "treeql=error"
    } else {
        "treeql=info"
    };

    // Logs go to stderr; stdout carries query text
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match treeql_cli::run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
