mod cli;
mod clipboard;
mod config;
mod error;
mod export;
mod formatter;
mod github;
mod ordering;
mod path_tree;
mod repo_url;
mod selection;
mod tree_view;
mod tui;
mod workflow;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

// RUST_LOG wins over -v. Logs go to stderr so stdout stays clean for --dry-run.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{}={default_level}", env!("CARGO_CRATE_NAME")))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // Handle daemon mode first. This should stay in main.rs as it's an early exit.
    if clipboard::run_daemon_if_requested()? {
        return Ok(());
    }

    let cli_args = cli::Cli::parse();
    init_logging(cli_args.verbose);

    workflow::run(cli_args)
}
