//! Main entry point for tabcompare CLI

use clap::Parser;
use tabcompare::cli::Cli;
use tabcompare::commands::execute_command;

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(tabcompare::cli::log_level(cli.verbose))
        .init();

    if let Err(e) = execute_command(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
